//! Batch model and profit aggregation rule

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderStatus;

/// A dated grouping of orders sharing aggregate profit reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub batch_number: String,
    pub date: NaiveDate,
    /// Derived: sum of gross profit over recognized member orders
    pub total_profit: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sum gross profit over orders whose status is recognized for reporting
/// (confirmed, shipping, completed). Pending, cancelled and all refund
/// statuses are excluded. Summing the same inputs twice yields the same
/// total.
pub fn recognized_profit_total<I>(orders: I) -> Decimal
where
    I: IntoIterator<Item = (OrderStatus, Decimal)>,
{
    orders
        .into_iter()
        .filter(|(status, _)| status.counts_toward_profit())
        .map(|(_, gross_profit)| gross_profit)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_only_recognized_statuses_counted() {
        let total = recognized_profit_total(vec![
            (OrderStatus::Confirmed, dec("670.00")),
            (OrderStatus::Pending, dec("300.00")),
            (OrderStatus::Cancelled, dec("200.00")),
        ]);
        assert_eq!(total, dec("670.00"));
    }

    #[test]
    fn test_refund_statuses_excluded() {
        let total = recognized_profit_total(vec![
            (OrderStatus::RefundRequested, dec("100.00")),
            (OrderStatus::Refunding, dec("100.00")),
            (OrderStatus::Refunded, dec("100.00")),
            (OrderStatus::Shipping, dec("50.00")),
            (OrderStatus::Completed, dec("25.00")),
        ]);
        assert_eq!(total, dec("75.00"));
    }

    #[test]
    fn test_empty_batch_totals_zero() {
        assert_eq!(recognized_profit_total(vec![]), Decimal::ZERO);
    }
}
