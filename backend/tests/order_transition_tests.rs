//! Order status machine tests
//!
//! Exercises the transition policy, the planned inventory effects and the
//! derived financial fields, including the documented end-to-end scenarios.

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{
    plan_stock_effect, OrderFinancials, OrderStatus, StockEffect, StockOperation,
    TransitionPolicy,
};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// In-memory mirror of an order transition: policy check, stock effect,
/// status update. Mirrors the service flow using the same shared primitives;
/// on error nothing changes.
struct SimOrder {
    status: OrderStatus,
    quantity: i32,
    stock_deducted: bool,
}

struct SimProduct {
    stock: i32,
    movements: Vec<i32>,
}

fn sim_transition(
    policy: &TransitionPolicy,
    order: &mut SimOrder,
    product: &mut SimProduct,
    to: OrderStatus,
) -> Result<(), String> {
    if !policy.is_allowed(order.status, to) {
        return Err(format!("cannot move from {} to {}", order.status, to));
    }

    match plan_stock_effect(order.stock_deducted, to) {
        StockEffect::Deduct => {
            let applied = StockOperation::Out {
                quantity: order.quantity,
            }
            .apply(product.stock)
            .map_err(|e| e.to_string())?;
            product.stock = applied.new_stock;
            product.movements.push(applied.quantity_delta);
            order.stock_deducted = true;
        }
        StockEffect::Restore => {
            let applied = StockOperation::In {
                quantity: order.quantity,
            }
            .apply(product.stock)
            .map_err(|e| e.to_string())?;
            product.stock = applied.new_stock;
            product.movements.push(applied.quantity_delta);
            order.stock_deducted = false;
        }
        StockEffect::None => {}
    }

    order.status = to;
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Documented scenario: stock 5, quantity 10, pending -> confirmed fails
    /// with insufficient stock; stock and status are unchanged.
    #[test]
    fn test_confirmation_fails_on_insufficient_stock() {
        let policy = TransitionPolicy::permissive();
        let mut order = SimOrder {
            status: OrderStatus::Pending,
            quantity: 10,
            stock_deducted: false,
        };
        let mut product = SimProduct {
            stock: 5,
            movements: Vec::new(),
        };

        let result = sim_transition(&policy, &mut order, &mut product, OrderStatus::Confirmed);

        assert!(result.is_err());
        assert_eq!(product.stock, 5);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.stock_deducted);
        assert!(product.movements.is_empty());
    }

    /// Documented scenario: stock 100, quantity 10, unit price 120.00, other
    /// costs 30.00, cost price 50.00. Confirming deducts to 90.
    #[test]
    fn test_confirmation_deducts_and_financials_derive() {
        let financials = OrderFinancials::compute(10, dec("120.00"), dec("50.00"), dec("30.00"));
        assert_eq!(financials.sales_amount, dec("1200.00"));
        assert_eq!(financials.total_cost, dec("530.00"));
        assert_eq!(financials.gross_profit, dec("670.00"));

        let policy = TransitionPolicy::permissive();
        let mut order = SimOrder {
            status: OrderStatus::Pending,
            quantity: 10,
            stock_deducted: false,
        };
        let mut product = SimProduct {
            stock: 100,
            movements: Vec::new(),
        };

        sim_transition(&policy, &mut order, &mut product, OrderStatus::Confirmed).unwrap();

        assert_eq!(product.stock, 90);
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert!(order.stock_deducted);
    }

    /// Documented scenario: a refund after confirmation restores the
    /// deducted quantity, including through the refund chain.
    #[test]
    fn test_refund_after_confirmation_restores_stock() {
        let policy = TransitionPolicy::strict();
        let mut order = SimOrder {
            status: OrderStatus::Pending,
            quantity: 10,
            stock_deducted: false,
        };
        let mut product = SimProduct {
            stock: 100,
            movements: Vec::new(),
        };

        sim_transition(&policy, &mut order, &mut product, OrderStatus::Confirmed).unwrap();
        assert_eq!(product.stock, 90);

        sim_transition(&policy, &mut order, &mut product, OrderStatus::RefundRequested).unwrap();
        sim_transition(&policy, &mut order, &mut product, OrderStatus::Refunding).unwrap();
        sim_transition(&policy, &mut order, &mut product, OrderStatus::Refunded).unwrap();

        assert_eq!(product.stock, 100);
        assert!(!order.stock_deducted);
        assert_eq!(product.movements, vec![-10, 10]);
    }

    /// Re-applying the current status never double-deducts.
    #[test]
    fn test_repeat_confirmation_is_idempotent() {
        let policy = TransitionPolicy::permissive();
        let mut order = SimOrder {
            status: OrderStatus::Pending,
            quantity: 10,
            stock_deducted: false,
        };
        let mut product = SimProduct {
            stock: 100,
            movements: Vec::new(),
        };

        sim_transition(&policy, &mut order, &mut product, OrderStatus::Confirmed).unwrap();
        sim_transition(&policy, &mut order, &mut product, OrderStatus::Confirmed).unwrap();
        sim_transition(&policy, &mut order, &mut product, OrderStatus::Shipping).unwrap();

        assert_eq!(product.stock, 90);
        assert_eq!(product.movements.len(), 1);
    }

    /// A never-confirmed order refunded directly has nothing to restore.
    #[test]
    fn test_refund_without_deduction_moves_no_stock() {
        let policy = TransitionPolicy::permissive();
        let mut order = SimOrder {
            status: OrderStatus::Pending,
            quantity: 10,
            stock_deducted: false,
        };
        let mut product = SimProduct {
            stock: 100,
            movements: Vec::new(),
        };

        sim_transition(&policy, &mut order, &mut product, OrderStatus::Refunded).unwrap();

        assert_eq!(product.stock, 100);
        assert!(product.movements.is_empty());
    }

    /// Cancellation keeps the deduction; reconciliation goes through adjust.
    #[test]
    fn test_cancellation_after_confirmation_keeps_stock() {
        let policy = TransitionPolicy::permissive();
        let mut order = SimOrder {
            status: OrderStatus::Confirmed,
            quantity: 10,
            stock_deducted: true,
        };
        let mut product = SimProduct {
            stock: 90,
            movements: Vec::new(),
        };

        sim_transition(&policy, &mut order, &mut product, OrderStatus::Cancelled).unwrap();

        assert_eq!(product.stock, 90);
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(order.stock_deducted);
    }

    /// Terminal statuses allow no further transitions under either policy.
    #[test]
    fn test_terminal_statuses_are_final() {
        for policy in [TransitionPolicy::permissive(), TransitionPolicy::strict()] {
            for terminal in [
                OrderStatus::Completed,
                OrderStatus::Cancelled,
                OrderStatus::Refunded,
            ] {
                for target in OrderStatus::ALL {
                    assert!(
                        !policy.is_allowed(terminal, target),
                        "{terminal} should not allow {target}"
                    );
                }
            }
        }
    }

    /// The strict policy rejects a jump the permissive one allows.
    #[test]
    fn test_policies_differ_on_jumps() {
        let permissive = TransitionPolicy::permissive();
        let strict = TransitionPolicy::strict();

        assert!(permissive.is_allowed(OrderStatus::Pending, OrderStatus::Completed));
        assert!(!strict.is_allowed(OrderStatus::Pending, OrderStatus::Completed));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![
            Just(OrderStatus::Pending),
            Just(OrderStatus::Confirmed),
            Just(OrderStatus::Shipping),
            Just(OrderStatus::Completed),
            Just(OrderStatus::Cancelled),
            Just(OrderStatus::RefundRequested),
            Just(OrderStatus::Refunding),
            Just(OrderStatus::Refunded),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Across any replay of transition attempts an order holds at most
        /// one deduction, stock never goes negative, and the final level
        /// differs from the initial one by exactly the held quantity.
        #[test]
        fn prop_stock_consumed_at_most_once(
            initial_stock in 0i32..=100,
            quantity in 1i32..=50,
            targets in prop::collection::vec(status_strategy(), 1..20)
        ) {
            let policy = TransitionPolicy::permissive();
            let mut order = SimOrder {
                status: OrderStatus::Pending,
                quantity,
                stock_deducted: false,
            };
            let mut product = SimProduct {
                stock: initial_stock,
                movements: Vec::new(),
            };

            for to in targets {
                let _ = sim_transition(&policy, &mut order, &mut product, to);
                prop_assert!(product.stock >= 0);

                // The order's net movement is either zero or one held deduction
                let net: i32 = product.movements.iter().sum();
                if order.stock_deducted {
                    prop_assert_eq!(net, -quantity);
                } else {
                    prop_assert_eq!(net, 0);
                }
            }

            let expected = if order.stock_deducted {
                initial_stock - quantity
            } else {
                initial_stock
            };
            prop_assert_eq!(product.stock, expected);
        }

        /// A rejected transition attempt changes neither status nor stock.
        #[test]
        fn prop_failed_transitions_change_nothing(
            initial_stock in 0i32..=100,
            quantity in 1i32..=50,
            targets in prop::collection::vec(status_strategy(), 1..20)
        ) {
            let policy = TransitionPolicy::strict();
            let mut order = SimOrder {
                status: OrderStatus::Pending,
                quantity,
                stock_deducted: false,
            };
            let mut product = SimProduct {
                stock: initial_stock,
                movements: Vec::new(),
            };

            for to in targets {
                let before_status = order.status;
                let before_stock = product.stock;
                let before_flag = order.stock_deducted;

                if sim_transition(&policy, &mut order, &mut product, to).is_err() {
                    prop_assert_eq!(order.status, before_status);
                    prop_assert_eq!(product.stock, before_stock);
                    prop_assert_eq!(order.stock_deducted, before_flag);
                }
            }
        }

        /// Derived financial fields always satisfy their defining equations.
        #[test]
        fn prop_financial_identities(
            quantity in 1i32..=1000,
            unit_price_cents in 0i64..=10_000_00,
            cost_price_cents in 0i64..=10_000_00,
            other_costs_cents in 0i64..=1_000_00
        ) {
            let unit_price = Decimal::new(unit_price_cents, 2);
            let cost_price = Decimal::new(cost_price_cents, 2);
            let other_costs = Decimal::new(other_costs_cents, 2);

            let f = OrderFinancials::compute(quantity, unit_price, cost_price, other_costs);

            prop_assert_eq!(f.sales_amount, (Decimal::from(quantity) * unit_price).round_dp(2));
            prop_assert_eq!(f.gross_profit, f.sales_amount - f.total_cost);
        }
    }
}
