//! Purchase lifecycle tests
//!
//! Purchases mirror sales on the inbound side: receiving enters stock and
//! records money out; cancellation exits the received quantities and
//! neutralizes the money entry.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{MoneyKind, MovementKind, PurchaseStatus};
use shared::validation::apply_movement;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// In-memory mirror of the purchase orchestration
struct PurchaseBook {
    balance: Decimal,
    money: Vec<(MoneyKind, Decimal)>,
    status: PurchaseStatus,
    total: Decimal,
    quantity: Decimal,
}

impl PurchaseBook {
    fn create(initial_balance: Decimal, quantity: Decimal, total: Decimal) -> Self {
        Self {
            balance: apply_movement(initial_balance, MovementKind::In, quantity),
            money: vec![(MoneyKind::Out, total)],
            status: PurchaseStatus::Received,
            total,
            quantity,
        }
    }

    /// Cancel: the received quantities leave stock again, pre-validated
    /// against the current balance, and a compensating money-in lands
    fn cancel(&mut self) -> Result<(), &'static str> {
        if self.status == PurchaseStatus::Canceled {
            return Err("Purchase is already canceled");
        }
        if self.quantity > self.balance {
            return Err("Insufficient stock");
        }
        self.balance = apply_movement(self.balance, MovementKind::Out, self.quantity);
        self.money.push((MoneyKind::In, self.total));
        self.status = PurchaseStatus::Canceled;
        Ok(())
    }

    fn money_net(&self) -> Decimal {
        self.money
            .iter()
            .fold(Decimal::ZERO, |acc, (kind, amount)| match kind {
                MoneyKind::In => acc + amount,
                MoneyKind::Out => acc - amount,
            })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_purchase_enters_stock_and_records_money_out() {
        let purchase = PurchaseBook::create(dec("10.0"), dec("25.0"), dec("300.0"));

        assert_eq!(purchase.balance, dec("35.0"));
        assert_eq!(purchase.money_net(), dec("-300.0"));
        assert_eq!(purchase.status, PurchaseStatus::Received);
    }

    #[test]
    fn test_cancel_reverses_both_ledgers() {
        let mut purchase = PurchaseBook::create(dec("10.0"), dec("25.0"), dec("300.0"));
        purchase.cancel().unwrap();

        assert_eq!(purchase.balance, dec("10.0"));
        assert_eq!(purchase.money_net(), Decimal::ZERO);
        assert_eq!(purchase.status, PurchaseStatus::Canceled);
    }

    #[test]
    fn test_cancel_fails_when_goods_already_left() {
        let mut purchase = PurchaseBook::create(dec("0.0"), dec("25.0"), dec("300.0"));
        // Most of the received quantity was sold in the meantime
        purchase.balance = dec("5.0");

        assert!(purchase.cancel().is_err());
        assert_eq!(purchase.status, PurchaseStatus::Received);
        assert_eq!(purchase.money.len(), 1);
    }

    #[test]
    fn test_second_cancel_fails() {
        let mut purchase = PurchaseBook::create(dec("0.0"), dec("25.0"), dec("300.0"));
        purchase.cancel().unwrap();

        assert!(purchase.cancel().is_err());
        assert_eq!(purchase.money.len(), 2);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Receive-then-cancel restores the balance and nets the money
        /// ledger to zero
        #[test]
        fn prop_cancel_round_trip(
            initial in quantity_strategy(),
            quantity in quantity_strategy(),
            total in amount_strategy()
        ) {
            let mut purchase = PurchaseBook::create(initial, quantity, total);

            prop_assert_eq!(purchase.balance, initial + quantity);
            prop_assert_eq!(purchase.money_net(), -total);

            purchase.cancel().unwrap();

            prop_assert_eq!(purchase.balance, initial);
            prop_assert_eq!(purchase.money_net(), Decimal::ZERO);
        }
    }
}
