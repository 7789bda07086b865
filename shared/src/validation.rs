//! Validation utilities for the Sales Management Platform

use rust_decimal::Decimal;

// ============================================================================
// Order and Stock Validations
// ============================================================================

/// Validate an order or stock movement quantity (must be positive)
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than zero");
    }
    Ok(())
}

/// Validate a unit price (cannot be negative)
pub fn validate_unit_price(unit_price: Decimal) -> Result<(), &'static str> {
    if unit_price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    Ok(())
}

/// Validate a cost value (cost price, other costs; cannot be negative)
pub fn validate_cost(cost: Decimal) -> Result<(), &'static str> {
    if cost < Decimal::ZERO {
        return Err("Cost cannot be negative");
    }
    Ok(())
}

/// Validate an absolute stock level (physical counts cannot be negative)
pub fn validate_stock_level(stock: i32) -> Result<(), &'static str> {
    if stock < 0 {
        return Err("Stock level cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Batch Validations
// ============================================================================

/// Validate a batch number: 1-50 characters, no surrounding whitespace
pub fn validate_batch_number(batch_number: &str) -> Result<(), &'static str> {
    if batch_number.trim().is_empty() {
        return Err("Batch number cannot be empty");
    }
    if batch_number.len() > 50 {
        return Err("Batch number must be at most 50 characters");
    }
    if batch_number != batch_number.trim() {
        return Err("Batch number cannot start or end with whitespace");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate a username: 3-50 characters, alphanumeric plus `.`/`_`/`-`
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 {
        return Err("Username must be at least 3 characters");
    }
    if username.len() > 50 {
        return Err("Username must be at most 50 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
    {
        return Err("Username may only contain letters, digits, '.', '_' and '-'");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a free-text name field (customer name, product name)
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty");
    }
    if name.len() > 100 {
        return Err("Name must be at most 100 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(1000).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(Decimal::ZERO).is_ok());
        assert!(validate_unit_price(dec("120.00")).is_ok());
        assert!(validate_unit_price(dec("-0.01")).is_err());
    }

    #[test]
    fn test_validate_cost() {
        assert!(validate_cost(dec("0.00")).is_ok());
        assert!(validate_cost(dec("-1.00")).is_err());
    }

    #[test]
    fn test_validate_stock_level() {
        assert!(validate_stock_level(0).is_ok());
        assert!(validate_stock_level(500).is_ok());
        assert!(validate_stock_level(-1).is_err());
    }

    #[test]
    fn test_validate_batch_number() {
        assert!(validate_batch_number("B-2024-001").is_ok());
        assert!(validate_batch_number("").is_err());
        assert!(validate_batch_number("   ").is_err());
        assert!(validate_batch_number(" B-1").is_err());
        assert!(validate_batch_number(&"X".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.b_c-1").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"u".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Widget").is_ok());
        assert!(validate_name("  ").is_err());
        assert!(validate_name(&"n".repeat(101)).is_err());
    }
}
