//! Order model and status machine rules
//!
//! The status machine is intentionally table-driven: which transitions are
//! allowed is data (`TransitionPolicy`), while the inventory side effect of a
//! transition is derived from the target status and whether the order
//! currently holds a stock deduction.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipping,
    Completed,
    Cancelled,
    RefundRequested,
    Refunding,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipping,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::RefundRequested,
        OrderStatus::Refunding,
        OrderStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::RefundRequested => "refund_requested",
            OrderStatus::Refunding => "refunding",
            OrderStatus::Refunded => "refunded",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "shipping" => Some(OrderStatus::Shipping),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refund_requested" => Some(OrderStatus::RefundRequested),
            "refunding" => Some(OrderStatus::Refunding),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }

    /// Human-readable label, returned alongside transition results
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending confirmation",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Shipping => "Shipping",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::RefundRequested => "Refund requested",
            OrderStatus::Refunding => "Refunding",
            OrderStatus::Refunded => "Refunded",
        }
    }

    /// Terminal statuses allow no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }

    /// Statuses that represent committed, inventory-affecting demand
    pub fn is_stock_consuming(&self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed | OrderStatus::Shipping | OrderStatus::Completed
        )
    }

    /// Statuses whose gross profit counts toward batch totals
    pub fn counts_toward_profit(&self) -> bool {
        self.is_stock_consuming()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed status transitions, keyed by current status
///
/// The documented flow is pending -> confirmed -> shipping -> completed with
/// cancellation/refund branches, but the documentation also permits jumps
/// between active statuses. Both readings are expressible here; the backend
/// selects one via configuration.
#[derive(Debug, Clone)]
pub struct TransitionPolicy {
    allowed: HashMap<OrderStatus, Vec<OrderStatus>>,
}

impl TransitionPolicy {
    /// Build a policy from an explicit transition table
    pub fn new(allowed: HashMap<OrderStatus, Vec<OrderStatus>>) -> Self {
        Self { allowed }
    }

    /// Any non-terminal status may move to any status, repeats included.
    /// Terminal statuses allow nothing.
    pub fn permissive() -> Self {
        let mut allowed = HashMap::new();
        for from in OrderStatus::ALL {
            let targets = if from.is_terminal() {
                Vec::new()
            } else {
                OrderStatus::ALL.to_vec()
            };
            allowed.insert(from, targets);
        }
        Self { allowed }
    }

    /// The documented general flow only: forward along
    /// pending -> confirmed -> shipping -> completed, cancellation and refund
    /// requests from any active status, and the refund chain
    /// refund_requested -> refunding -> refunded. Repeating the current
    /// status is always allowed (transitions are effect-idempotent).
    pub fn strict() -> Self {
        use OrderStatus::*;
        let mut allowed: HashMap<OrderStatus, Vec<OrderStatus>> = HashMap::new();
        allowed.insert(Pending, vec![Pending, Confirmed, Cancelled, RefundRequested]);
        allowed.insert(Confirmed, vec![Confirmed, Shipping, Cancelled, RefundRequested]);
        allowed.insert(Shipping, vec![Shipping, Completed, Cancelled, RefundRequested]);
        allowed.insert(RefundRequested, vec![RefundRequested, Refunding, Cancelled]);
        allowed.insert(Refunding, vec![Refunding, Refunded]);
        allowed.insert(Completed, Vec::new());
        allowed.insert(Cancelled, Vec::new());
        allowed.insert(Refunded, Vec::new());
        Self { allowed }
    }

    pub fn is_allowed(&self, from: OrderStatus, to: OrderStatus) -> bool {
        self.allowed
            .get(&from)
            .map(|targets| targets.contains(&to))
            .unwrap_or(false)
    }
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self::permissive()
    }
}

/// Inventory side effect of a status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    /// No inventory movement
    None,
    /// Deduct the order quantity from product stock
    Deduct,
    /// Return the order quantity to product stock
    Restore,
}

/// Decide the inventory effect of moving an order to `to`.
///
/// `stock_deducted` is whether the order currently holds a deduction. Keying
/// on the flag rather than the previous status gives two invariants for free:
/// an order consumes stock at most once no matter how its status is replayed,
/// and a refund restores stock even when it arrives through the
/// refund_requested -> refunding chain.
pub fn plan_stock_effect(stock_deducted: bool, to: OrderStatus) -> StockEffect {
    if to.is_stock_consuming() && !stock_deducted {
        StockEffect::Deduct
    } else if to == OrderStatus::Refunded && stock_deducted {
        StockEffect::Restore
    } else {
        StockEffect::None
    }
}

/// Derived monetary fields of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFinancials {
    pub sales_amount: Decimal,
    pub total_cost: Decimal,
    pub gross_profit: Decimal,
}

impl OrderFinancials {
    /// Recompute all derived monetary fields, rounded to 2 decimal places:
    /// sales_amount = quantity * unit_price,
    /// total_cost = quantity * cost_price + other_costs,
    /// gross_profit = sales_amount - total_cost.
    pub fn compute(
        quantity: i32,
        unit_price: Decimal,
        cost_price: Decimal,
        other_costs: Decimal,
    ) -> Self {
        let qty = Decimal::from(quantity);
        let sales_amount = (qty * unit_price).round_dp(2);
        let total_cost = (qty * cost_price + other_costs).round_dp(2);
        let gross_profit = sales_amount - total_cost;
        Self {
            sales_amount,
            total_cost,
            gross_profit,
        }
    }
}

/// An order within a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub sales_amount: Decimal,
    pub other_costs: Decimal,
    pub total_cost: Decimal,
    pub gross_profit: Decimal,
    pub status: OrderStatus,
    /// Whether this order currently holds a stock deduction
    pub stock_deducted: bool,
    pub order_date: NaiveDate,
    pub remark: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_status_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_str("shipped"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Refunding.is_terminal());
    }

    #[test]
    fn test_stock_consuming_set() {
        let consuming: Vec<_> = OrderStatus::ALL
            .iter()
            .filter(|s| s.is_stock_consuming())
            .collect();
        assert_eq!(
            consuming,
            vec![
                &OrderStatus::Confirmed,
                &OrderStatus::Shipping,
                &OrderStatus::Completed
            ]
        );
    }

    #[test]
    fn test_permissive_policy_allows_jumps() {
        let policy = TransitionPolicy::permissive();
        assert!(policy.is_allowed(OrderStatus::Pending, OrderStatus::Completed));
        assert!(policy.is_allowed(OrderStatus::Shipping, OrderStatus::Pending));
        assert!(policy.is_allowed(OrderStatus::Confirmed, OrderStatus::Confirmed));
    }

    #[test]
    fn test_permissive_policy_blocks_terminal_exits() {
        let policy = TransitionPolicy::permissive();
        assert!(!policy.is_allowed(OrderStatus::Completed, OrderStatus::Refunded));
        assert!(!policy.is_allowed(OrderStatus::Cancelled, OrderStatus::Pending));
        assert!(!policy.is_allowed(OrderStatus::Refunded, OrderStatus::Pending));
    }

    #[test]
    fn test_strict_policy_forward_flow() {
        let policy = TransitionPolicy::strict();
        assert!(policy.is_allowed(OrderStatus::Pending, OrderStatus::Confirmed));
        assert!(policy.is_allowed(OrderStatus::Confirmed, OrderStatus::Shipping));
        assert!(policy.is_allowed(OrderStatus::Shipping, OrderStatus::Completed));
        assert!(!policy.is_allowed(OrderStatus::Pending, OrderStatus::Completed));
        assert!(!policy.is_allowed(OrderStatus::Shipping, OrderStatus::Confirmed));
    }

    #[test]
    fn test_strict_policy_refund_chain() {
        let policy = TransitionPolicy::strict();
        assert!(policy.is_allowed(OrderStatus::Confirmed, OrderStatus::RefundRequested));
        assert!(policy.is_allowed(OrderStatus::RefundRequested, OrderStatus::Refunding));
        assert!(policy.is_allowed(OrderStatus::Refunding, OrderStatus::Refunded));
        assert!(!policy.is_allowed(OrderStatus::Confirmed, OrderStatus::Refunded));
    }

    #[test]
    fn test_stock_effect_first_confirmation_deducts() {
        assert_eq!(
            plan_stock_effect(false, OrderStatus::Confirmed),
            StockEffect::Deduct
        );
        assert_eq!(
            plan_stock_effect(false, OrderStatus::Completed),
            StockEffect::Deduct
        );
    }

    #[test]
    fn test_stock_effect_repeat_confirmation_is_noop() {
        assert_eq!(
            plan_stock_effect(true, OrderStatus::Confirmed),
            StockEffect::None
        );
        assert_eq!(
            plan_stock_effect(true, OrderStatus::Shipping),
            StockEffect::None
        );
    }

    #[test]
    fn test_stock_effect_refund_restores_only_held_stock() {
        assert_eq!(
            plan_stock_effect(true, OrderStatus::Refunded),
            StockEffect::Restore
        );
        // A never-confirmed order has nothing to restore
        assert_eq!(
            plan_stock_effect(false, OrderStatus::Refunded),
            StockEffect::None
        );
    }

    #[test]
    fn test_stock_effect_cancellation_keeps_stock() {
        assert_eq!(
            plan_stock_effect(true, OrderStatus::Cancelled),
            StockEffect::None
        );
    }

    #[test]
    fn test_financials_documented_scenario() {
        let f = OrderFinancials::compute(10, dec("120.00"), dec("50.00"), dec("30.00"));
        assert_eq!(f.sales_amount, dec("1200.00"));
        assert_eq!(f.total_cost, dec("530.00"));
        assert_eq!(f.gross_profit, dec("670.00"));
    }

    #[test]
    fn test_financials_rounding() {
        let f = OrderFinancials::compute(3, dec("0.333"), dec("0.10"), dec("0.00"));
        assert_eq!(f.sales_amount, dec("1.00"));
        assert_eq!(f.total_cost, dec("0.30"));
        assert_eq!(f.gross_profit, dec("0.70"));
    }
}
