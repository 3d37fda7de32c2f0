//! Sale lifecycle tests
//!
//! A sale's effects come in pairs: stock out + money in at creation,
//! stock back + money out at cancellation. These tests pin down the
//! round-trip invariants and the double-cancel guard.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{MoneyKind, MovementKind, SaleStatus};
use shared::validation::{apply_movement, compute_totals, payment_fits};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// In-memory mirror of the sale orchestration: one stock balance, a money
/// ledger, and the sale status
struct SaleBook {
    balance: Decimal,
    money: Vec<(MoneyKind, Decimal)>,
    status: SaleStatus,
    total: Decimal,
    quantity: Decimal,
}

impl SaleBook {
    /// Create a completed sale: stock exits and money comes in, or the
    /// whole thing fails
    fn create(
        initial_balance: Decimal,
        quantity: Decimal,
        total: Decimal,
    ) -> Result<Self, &'static str> {
        if quantity > initial_balance {
            return Err("Insufficient stock");
        }
        Ok(Self {
            balance: apply_movement(initial_balance, MovementKind::Out, quantity),
            money: vec![(MoneyKind::In, total)],
            status: SaleStatus::Completed,
            total,
            quantity,
        })
    }

    /// Cancel: stock returns, a compensating money-out neutralizes the
    /// original entry
    fn cancel(&mut self) -> Result<(), &'static str> {
        if self.status == SaleStatus::Canceled {
            return Err("Sale is already canceled");
        }
        self.balance = apply_movement(self.balance, MovementKind::In, self.quantity);
        self.money.push((MoneyKind::Out, self.total));
        self.status = SaleStatus::Canceled;
        Ok(())
    }

    /// Net money ledger position attributable to this sale
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
    fn test_sale_decrements_stock_and_records_money_in() {
        let sale = SaleBook::create(dec("50.0"), dec("8.0"), dec("120.0")).unwrap();

        assert_eq!(sale.balance, dec("42.0"));
        assert_eq!(sale.money_net(), dec("120.0"));
        assert_eq!(sale.status, SaleStatus::Completed);
    }

    #[test]
    fn test_sale_beyond_balance_fails_and_changes_nothing() {
        let result = SaleBook::create(dec("5.0"), dec("8.0"), dec("120.0"));
        assert!(result.is_err());
    }

    #[test]
    fn test_cancel_restores_stock_and_nets_money_to_zero() {
        let mut sale = SaleBook::create(dec("50.0"), dec("8.0"), dec("120.0")).unwrap();
        sale.cancel().unwrap();

        assert_eq!(sale.balance, dec("50.0"));
        assert_eq!(sale.money_net(), Decimal::ZERO);
        assert_eq!(sale.status, SaleStatus::Canceled);
    }

    #[test]
    fn test_second_cancel_fails_without_new_movements() {
        let mut sale = SaleBook::create(dec("50.0"), dec("8.0"), dec("120.0")).unwrap();
        sale.cancel().unwrap();
        let movements_before = sale.money.len();
        let balance_before = sale.balance;

        assert!(sale.cancel().is_err());
        assert_eq!(sale.money.len(), movements_before);
        assert_eq!(sale.balance, balance_before);
    }

    #[test]
    fn test_sale_totals_match_order_arithmetic() {
        let lines = [(dec("3"), dec("15.0")), (dec("1"), dec("55.0"))];
        let totals = compute_totals(&lines, dec("20.0"), Decimal::ZERO).unwrap();

        assert_eq!(totals.subtotal, dec("100.0"));
        assert_eq!(totals.total, dec("80.0"));
    }

    #[test]
    fn test_sale_payments_capped_at_total() {
        let total = dec("80.0");
        let payments = [dec("50.0"), dec("30.0")];

        let mut paid = Decimal::ZERO;
        for amount in payments {
            assert!(payment_fits(total, paid, amount));
            paid += amount;
        }

        // One more cent would breach the cap
        assert!(!payment_fits(total, paid, dec("0.01")));
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

        /// Create-then-cancel is a complete round trip: the warehouse
        /// balance is restored and the sale nets to zero in the money
        /// ledger
        #[test]
        fn prop_cancel_round_trip(
            headroom in quantity_strategy(),
            quantity in quantity_strategy(),
            total in amount_strategy()
        ) {
            let initial = quantity + headroom;
            let mut sale = SaleBook::create(initial, quantity, total).unwrap();

            prop_assert_eq!(sale.balance, initial - quantity);
            prop_assert_eq!(sale.money_net(), total);

            sale.cancel().unwrap();

            prop_assert_eq!(sale.balance, initial);
            prop_assert_eq!(sale.money_net(), Decimal::ZERO);
        }

        /// A sale exceeding the available balance never goes through
        #[test]
        fn prop_insufficient_stock_always_fails(
            balance in quantity_strategy(),
            excess in quantity_strategy(),
            total in amount_strategy()
        ) {
            let result = SaleBook::create(balance, balance + excess, total);
            prop_assert!(result.is_err());
        }

        /// However many cancel attempts arrive, only the first one moves
        /// anything
        #[test]
        fn prop_cancel_is_idempotent_in_effect(
            quantity in quantity_strategy(),
            total in amount_strategy(),
            attempts in 2usize..5
        ) {
            let initial = quantity * Decimal::from(2u32);
            let mut sale = SaleBook::create(initial, quantity, total).unwrap();

            let mut succeeded = 0;
            for _ in 0..attempts {
                if sale.cancel().is_ok() {
                    succeeded += 1;
                }
            }

            prop_assert_eq!(succeeded, 1);
            prop_assert_eq!(sale.balance, initial);
            prop_assert_eq!(sale.money_net(), Decimal::ZERO);
            // Exactly one compensating entry exists
            prop_assert_eq!(sale.money.len(), 2);
        }
    }
}
