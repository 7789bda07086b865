//! Batch profit aggregation tests
//!
//! The aggregation rule: total profit is the sum of gross profit over orders
//! in recognized statuses (confirmed, shipping, completed), and recomputing
//! with unchanged inputs yields an unchanged total.

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{recognized_profit_total, OrderStatus};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Documented scenario: 670.00 confirmed + 300.00 pending + 200.00
    /// cancelled totals 670.00.
    #[test]
    fn test_only_confirmed_counted() {
        let orders = vec![
            (OrderStatus::Confirmed, dec("670.00")),
            (OrderStatus::Pending, dec("300.00")),
            (OrderStatus::Cancelled, dec("200.00")),
        ];
        assert_eq!(recognized_profit_total(orders), dec("670.00"));
    }

    #[test]
    fn test_all_recognized_statuses_counted() {
        let orders = vec![
            (OrderStatus::Confirmed, dec("100.00")),
            (OrderStatus::Shipping, dec("50.00")),
            (OrderStatus::Completed, dec("25.00")),
        ];
        assert_eq!(recognized_profit_total(orders), dec("175.00"));
    }

    #[test]
    fn test_refund_chain_excluded() {
        let orders = vec![
            (OrderStatus::RefundRequested, dec("10.00")),
            (OrderStatus::Refunding, dec("20.00")),
            (OrderStatus::Refunded, dec("30.00")),
        ];
        assert_eq!(recognized_profit_total(orders), Decimal::ZERO);
    }

    #[test]
    fn test_negative_profit_orders_still_counted() {
        let orders = vec![
            (OrderStatus::Confirmed, dec("-40.00")),
            (OrderStatus::Completed, dec("100.00")),
        ];
        assert_eq!(recognized_profit_total(orders), dec("60.00"));
    }

    #[test]
    fn test_empty_batch_totals_zero() {
        assert_eq!(recognized_profit_total(Vec::new()), Decimal::ZERO);
    }

    /// Recomputing twice with no intervening change yields the same total.
    #[test]
    fn test_recompute_is_idempotent() {
        let orders = vec![
            (OrderStatus::Confirmed, dec("670.00")),
            (OrderStatus::Shipping, dec("120.50")),
            (OrderStatus::Pending, dec("55.00")),
        ];
        let first = recognized_profit_total(orders.clone());
        let second = recognized_profit_total(orders);
        assert_eq!(first, second);
    }

    /// A status change moves an order's profit in or out of the total.
    #[test]
    fn test_transition_changes_total() {
        let mut orders = vec![
            (OrderStatus::Confirmed, dec("670.00")),
            (OrderStatus::Pending, dec("300.00")),
        ];
        assert_eq!(recognized_profit_total(orders.clone()), dec("670.00"));

        orders[1].0 = OrderStatus::Confirmed;
        assert_eq!(recognized_profit_total(orders.clone()), dec("970.00"));

        orders[0].0 = OrderStatus::Refunded;
        assert_eq!(recognized_profit_total(orders), dec("300.00"));
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

    fn orders_strategy() -> impl Strategy<Value = Vec<(OrderStatus, Decimal)>> {
        prop::collection::vec(
            (status_strategy(), (-100_000i64..=100_000).prop_map(|c| Decimal::new(c, 2))),
            0..30,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Recomputation is idempotent for arbitrary inputs.
        #[test]
        fn prop_recompute_idempotent(orders in orders_strategy()) {
            let first = recognized_profit_total(orders.clone());
            let second = recognized_profit_total(orders);
            prop_assert_eq!(first, second);
        }

        /// The total equals the sum over the recognized subset and ignores
        /// everything else.
        #[test]
        fn prop_total_matches_recognized_subset(orders in orders_strategy()) {
            let expected: Decimal = orders
                .iter()
                .filter(|(s, _)| {
                    matches!(
                        s,
                        OrderStatus::Confirmed | OrderStatus::Shipping | OrderStatus::Completed
                    )
                })
                .map(|(_, p)| *p)
                .sum();
            prop_assert_eq!(recognized_profit_total(orders), expected);
        }

        /// Adding an unrecognized order never changes the total.
        #[test]
        fn prop_unrecognized_orders_are_inert(
            orders in orders_strategy(),
            profit_cents in -100_000i64..=100_000
        ) {
            let base = recognized_profit_total(orders.clone());
            for status in [
                OrderStatus::Pending,
                OrderStatus::Cancelled,
                OrderStatus::RefundRequested,
                OrderStatus::Refunding,
                OrderStatus::Refunded,
            ] {
                let mut extended = orders.clone();
                extended.push((status, Decimal::new(profit_cents, 2)));
                prop_assert_eq!(recognized_profit_total(extended), base);
            }
        }

        /// Order of members never affects the total.
        #[test]
        fn prop_total_is_order_independent(orders in orders_strategy()) {
            let mut reversed = orders.clone();
            reversed.reverse();
            prop_assert_eq!(
                recognized_profit_total(orders),
                recognized_profit_total(reversed)
            );
        }
    }
}
