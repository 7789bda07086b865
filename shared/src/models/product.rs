//! Product model and stock level classification

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default boundary below which a product counts as low on stock
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

/// A sellable product
///
/// `name` + `specification` form a unique pair. `current_stock` is mutated
/// only through ledger operations; `sold_quantity` is derived from the
/// product's stock-consuming orders and recomputed on write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub specification: String,
    pub cost_price: Decimal,
    pub current_stock: i32,
    pub sold_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

/// Classify a stock level against a threshold: 0 is out of stock,
/// 1..=threshold is low, anything above is in stock.
pub fn stock_status(current_stock: i32, threshold: i32) -> StockStatus {
    if current_stock <= 0 {
        StockStatus::OutOfStock
    } else if current_stock <= threshold {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_status_boundaries() {
        assert_eq!(stock_status(0, 10), StockStatus::OutOfStock);
        assert_eq!(stock_status(1, 10), StockStatus::LowStock);
        assert_eq!(stock_status(10, 10), StockStatus::LowStock);
        assert_eq!(stock_status(11, 10), StockStatus::InStock);
    }

    #[test]
    fn test_stock_status_custom_threshold() {
        assert_eq!(stock_status(25, 50), StockStatus::LowStock);
        assert_eq!(stock_status(25, 10), StockStatus::InStock);
    }
}
