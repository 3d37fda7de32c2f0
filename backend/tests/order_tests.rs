//! Order lifecycle tests
//!
//! Covers the fulfillment state machine, totals arithmetic, the
//! confirm/cancel stock round trip, and the payment cap.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{MovementKind, OrderStatus, PaymentStatus};
use shared::validation::{
    apply_movement, compute_totals, payment_fits, settle_payment_status,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

const ALL_STATUSES: [OrderStatus; 6] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Delivered,
    OrderStatus::Canceled,
];

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// The full transition table of the fulfillment chain
    #[test]
    fn test_transition_table() {
        let allowed = [
            (OrderStatus::Pending, OrderStatus::Confirmed),
            (OrderStatus::Pending, OrderStatus::Canceled),
            (OrderStatus::Confirmed, OrderStatus::Preparing),
            (OrderStatus::Confirmed, OrderStatus::Canceled),
            (OrderStatus::Preparing, OrderStatus::Ready),
            (OrderStatus::Preparing, OrderStatus::Canceled),
            (OrderStatus::Ready, OrderStatus::Delivered),
            (OrderStatus::Ready, OrderStatus::Canceled),
        ];

        for from in ALL_STATUSES {
            for to in ALL_STATUSES {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{} -> {}",
                    from.as_str(),
                    to.as_str()
                );
            }
        }
    }

    /// Confirming then canceling returns exactly the reserved quantities
    #[test]
    fn test_confirm_cancel_round_trip() {
        let order_quantity = dec("7.0");
        let initial_balance = dec("20.0");

        // PENDING -> CONFIRMED exits stock once
        let after_confirm = apply_movement(initial_balance, MovementKind::Out, order_quantity);
        assert_eq!(after_confirm, dec("13.0"));

        // CONFIRMED -> CANCELED returns the same quantity
        let after_cancel = apply_movement(after_confirm, MovementKind::In, order_quantity);
        assert_eq!(after_cancel, initial_balance);
    }

    /// Totals: subtotal minus discount plus delivery fee
    #[test]
    fn test_totals_computation() {
        let lines = [(dec("2"), dec("30.0")), (dec("4"), dec("10.0"))];
        let totals = compute_totals(&lines, dec("10.0"), dec("5.0")).unwrap();

        assert_eq!(totals.subtotal, dec("100.0"));
        assert_eq!(totals.total, dec("95.0"));
    }

    /// Discounting below zero total is rejected at the subtotal boundary
    #[test]
    fn test_discount_capped_by_subtotal() {
        let lines = [(dec("1"), dec("50.0"))];
        assert!(compute_totals(&lines, dec("50.0"), Decimal::ZERO).is_ok());
        assert!(compute_totals(&lines, dec("50.01"), Decimal::ZERO).is_err());
    }

    /// Payments accumulate up to the total and no further
    #[test]
    fn test_payment_cap_sequence() {
        let total = dec("100.0");
        let mut paid = Decimal::ZERO;

        // 60 then 40 is accepted cumulatively up to the total
        assert!(payment_fits(total, paid, dec("60.0")));
        paid += dec("60.0");
        assert!(payment_fits(total, paid, dec("40.0")));
        paid += dec("40.0");
        assert_eq!(settle_payment_status(total, paid), PaymentStatus::Paid);

        // 60 then 60 fails on the second payment
        let mut paid = Decimal::ZERO;
        assert!(payment_fits(total, paid, dec("60.0")));
        paid += dec("60.0");
        assert!(!payment_fits(total, paid, dec("60.0")));
        assert_eq!(settle_payment_status(total, paid), PaymentStatus::Pending);
    }

    /// A discounted order caps payments at the computed total, not the subtotal
    #[test]
    fn test_payment_cap_uses_discounted_total() {
        let lines = [(dec("1"), dec("100.0"))];
        let totals = compute_totals(&lines, dec("10.0"), Decimal::ZERO).unwrap();
        assert_eq!(totals.total, dec("90.0"));

        assert!(payment_fits(totals.total, dec("60.0"), dec("30.0")));
        assert!(!payment_fits(totals.total, dec("60.0"), dec("60.0")));
    }

    /// Payment status follows the paid sum
    #[test]
    fn test_payment_status_settling() {
        let total = dec("90.0");
        assert_eq!(
            settle_payment_status(total, Decimal::ZERO),
            PaymentStatus::Open
        );
        assert_eq!(
            settle_payment_status(total, dec("45.0")),
            PaymentStatus::Pending
        );
        assert_eq!(settle_payment_status(total, total), PaymentStatus::Paid);
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
            Just(OrderStatus::Preparing),
            Just(OrderStatus::Ready),
            Just(OrderStatus::Delivered),
            Just(OrderStatus::Canceled),
        ]
    }

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Terminal states never transition; non-terminal states can
        /// always cancel
        #[test]
        fn prop_cancel_always_available_until_terminal(status in status_strategy()) {
            if status.is_terminal() {
                for next in ALL_STATUSES {
                    prop_assert!(!status.can_transition_to(next));
                }
            } else {
                prop_assert!(status.can_transition_to(OrderStatus::Canceled));
            }
        }

        /// Stock-holding states are exactly the ones between confirm and
        /// delivery
        #[test]
        fn prop_holds_stock_matches_chain_position(status in status_strategy()) {
            let expected = matches!(
                status,
                OrderStatus::Confirmed | OrderStatus::Preparing | OrderStatus::Ready
            );
            prop_assert_eq!(status.holds_stock(), expected);
        }

        /// Any walk along allowed transitions that ends in CANCELED leaves
        /// the balance where it started: stock exits at most once and the
        /// cancellation returns it
        #[test]
        fn prop_random_walk_cancel_restores_balance(
            initial in quantity_strategy(),
            quantity in quantity_strategy(),
            steps in prop::collection::vec(status_strategy(), 1..10)
        ) {
            prop_assume!(quantity <= initial);

            let mut status = OrderStatus::Pending;
            let mut balance = initial;

            for next in steps {
                if !status.can_transition_to(next) {
                    continue;
                }
                if next == OrderStatus::Confirmed && !status.holds_stock() {
                    balance = apply_movement(balance, MovementKind::Out, quantity);
                }
                if next == OrderStatus::Canceled && status.holds_stock() {
                    balance = apply_movement(balance, MovementKind::In, quantity);
                }
                status = next;
                if status.is_terminal() {
                    break;
                }
            }

            match status {
                // Canceled or never-confirmed orders hold nothing
                OrderStatus::Canceled | OrderStatus::Pending => {
                    prop_assert_eq!(balance, initial)
                }
                // Delivered and in-flight orders hold exactly the order quantity
                _ => prop_assert_eq!(balance, initial - quantity),
            }
        }

        /// Total is subtotal - discount + delivery fee, and never negative
        #[test]
        fn prop_totals_arithmetic(
            lines in prop::collection::vec((quantity_strategy(), price_strategy()), 1..10),
            discount_percent in 0u32..=100,
            delivery_fee in price_strategy()
        ) {
            let subtotal: Decimal = lines.iter().map(|(q, p)| q * p).sum();
            let discount = subtotal * Decimal::from(discount_percent) / Decimal::from(100u32);

            let totals = compute_totals(&lines, discount, delivery_fee).unwrap();

            prop_assert_eq!(totals.subtotal, subtotal);
            prop_assert_eq!(totals.total, subtotal - discount + delivery_fee);
            prop_assert!(totals.total >= Decimal::ZERO);
        }

        /// The recorded payment sum never exceeds the total, whatever the
        /// sequence of attempts
        #[test]
        fn prop_payments_never_exceed_total(
            total in price_strategy(),
            attempts in prop::collection::vec(price_strategy(), 1..20)
        ) {
            let mut paid = Decimal::ZERO;
            for amount in attempts {
                if payment_fits(total, paid, amount) {
                    paid += amount;
                }
            }
            prop_assert!(paid <= total);
        }
    }
}
