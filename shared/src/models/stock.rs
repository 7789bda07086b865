//! Inventory ledger models and arithmetic

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Kinds of stock mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockOperationType {
    In,
    Out,
    Adjust,
}

impl StockOperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockOperationType::In => "in",
            StockOperationType::Out => "out",
            StockOperationType::Adjust => "adjust",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in" => Some(StockOperationType::In),
            "out" => Some(StockOperationType::Out),
            "adjust" => Some(StockOperationType::Adjust),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockOperationType::In => "Stock in",
            StockOperationType::Out => "Stock out",
            StockOperationType::Adjust => "Adjustment",
        }
    }
}

/// A requested stock mutation, keyed by `operation_type` on the wire.
///
/// `in`/`out` carry a positive quantity delta; `adjust` carries the explicit
/// resulting stock value and bypasses delta arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation_type", rename_all = "snake_case")]
pub enum StockOperation {
    In { quantity: i32 },
    Out { quantity: i32 },
    Adjust { after_stock: i32 },
}

/// Why a stock mutation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("insufficient stock: {available} available")]
    Insufficient { available: i32 },
    #[error("quantity must be positive")]
    NonPositiveQuantity,
    #[error("adjusted stock cannot be negative")]
    NegativeAdjustment,
}

/// Outcome of applying an operation to a stock level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockApplied {
    pub new_stock: i32,
    /// Signed change recorded in the audit log (positive = increase)
    pub quantity_delta: i32,
}

impl StockOperation {
    pub fn operation_type(&self) -> StockOperationType {
        match self {
            StockOperation::In { .. } => StockOperationType::In,
            StockOperation::Out { .. } => StockOperationType::Out,
            StockOperation::Adjust { .. } => StockOperationType::Adjust,
        }
    }

    /// Apply this operation to the current stock level.
    ///
    /// Pure arithmetic; the caller is responsible for holding the product
    /// lock so the check-then-write cannot race. The result never goes
    /// negative.
    pub fn apply(&self, current_stock: i32) -> Result<StockApplied, StockError> {
        match *self {
            StockOperation::In { quantity } => {
                if quantity <= 0 {
                    return Err(StockError::NonPositiveQuantity);
                }
                Ok(StockApplied {
                    new_stock: current_stock + quantity,
                    quantity_delta: quantity,
                })
            }
            StockOperation::Out { quantity } => {
                if quantity <= 0 {
                    return Err(StockError::NonPositiveQuantity);
                }
                if current_stock < quantity {
                    return Err(StockError::Insufficient {
                        available: current_stock,
                    });
                }
                Ok(StockApplied {
                    new_stock: current_stock - quantity,
                    quantity_delta: -quantity,
                })
            }
            StockOperation::Adjust { after_stock } => {
                if after_stock < 0 {
                    return Err(StockError::NegativeAdjustment);
                }
                Ok(StockApplied {
                    new_stock: after_stock,
                    quantity_delta: after_stock - current_stock,
                })
            }
        }
    }
}

/// An immutable stock audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub operation_type: StockOperationType,
    /// Signed change (positive = increase); for adjust, the applied delta
    pub quantity: i32,
    pub before_stock: i32,
    pub after_stock: i32,
    pub remark: String,
    pub operated_by: Uuid,
    pub operated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_type_round_trip() {
        for op in [
            StockOperationType::In,
            StockOperationType::Out,
            StockOperationType::Adjust,
        ] {
            assert_eq!(StockOperationType::from_str(op.as_str()), Some(op));
        }
        assert_eq!(StockOperationType::from_str("transfer"), None);
    }

    #[test]
    fn test_stock_in_adds() {
        let applied = StockOperation::In { quantity: 30 }.apply(100).unwrap();
        assert_eq!(applied.new_stock, 130);
        assert_eq!(applied.quantity_delta, 30);
    }

    #[test]
    fn test_stock_out_subtracts() {
        let applied = StockOperation::Out { quantity: 30 }.apply(100).unwrap();
        assert_eq!(applied.new_stock, 70);
        assert_eq!(applied.quantity_delta, -30);
    }

    #[test]
    fn test_stock_out_insufficient() {
        let err = StockOperation::Out { quantity: 10 }.apply(5).unwrap_err();
        assert_eq!(err, StockError::Insufficient { available: 5 });
    }

    #[test]
    fn test_stock_out_exact_balance() {
        let applied = StockOperation::Out { quantity: 5 }.apply(5).unwrap();
        assert_eq!(applied.new_stock, 0);
    }

    #[test]
    fn test_adjust_sets_absolute_value() {
        let applied = StockOperation::Adjust { after_stock: 42 }.apply(7).unwrap();
        assert_eq!(applied.new_stock, 42);
        assert_eq!(applied.quantity_delta, 35);

        let down = StockOperation::Adjust { after_stock: 0 }.apply(7).unwrap();
        assert_eq!(down.new_stock, 0);
        assert_eq!(down.quantity_delta, -7);
    }

    #[test]
    fn test_adjust_rejects_negative() {
        let err = StockOperation::Adjust { after_stock: -1 }.apply(7).unwrap_err();
        assert_eq!(err, StockError::NegativeAdjustment);
    }

    #[test]
    fn test_non_positive_quantities_rejected() {
        assert!(StockOperation::In { quantity: 0 }.apply(10).is_err());
        assert!(StockOperation::Out { quantity: -3 }.apply(10).is_err());
    }

    #[test]
    fn test_wire_format_is_tagged_by_operation_type() {
        let op: StockOperation =
            serde_json::from_str(r#"{"operation_type":"adjust","after_stock":12}"#).unwrap();
        assert_eq!(op, StockOperation::Adjust { after_stock: 12 });

        let json = serde_json::to_string(&StockOperation::Out { quantity: 4 }).unwrap();
        assert!(json.contains(r#""operation_type":"out""#));
    }

    #[test]
    fn test_wire_format_missing_variant_field_rejected() {
        // An adjust body must carry after_stock, not quantity
        let result: Result<StockOperation, _> =
            serde_json::from_str(r#"{"operation_type":"adjust","quantity":12}"#);
        assert!(result.is_err());
    }
}
