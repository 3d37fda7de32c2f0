//! Stock ledger tests
//!
//! Covers the ledger invariants:
//! - balance always equals the signed sum of the movement history
//! - transfers produce exactly one OUT/IN pair of equal quantity
//! - insufficient stock fails before any movement is written

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{MovementKind, StockReference};
use shared::validation::{apply_movement, signed_sum, validate_quantity};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// In-memory mirror of the stock ledger semantics: a materialized balance
/// per (product, warehouse) plus an append-only movement log.
#[derive(Default)]
struct Ledger {
    balances: HashMap<(Uuid, Uuid), Decimal>,
    movements: Vec<Movement>,
}

#[derive(Clone)]
struct Movement {
    product_id: Uuid,
    warehouse_id: Uuid,
    kind: MovementKind,
    quantity: Decimal,
    reference_type: Option<StockReference>,
    reference_id: Option<Uuid>,
}

impl Ledger {
    fn balance(&self, product_id: Uuid, warehouse_id: Uuid) -> Decimal {
        self.balances
            .get(&(product_id, warehouse_id))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// The ledger primitive: append a movement and apply the delta. No
    /// sufficiency check here; callers pre-validate.
    fn apply(
        &mut self,
        product_id: Uuid,
        warehouse_id: Uuid,
        kind: MovementKind,
        quantity: Decimal,
        reference_type: Option<StockReference>,
        reference_id: Option<Uuid>,
    ) -> Result<(), &'static str> {
        validate_quantity(quantity)?;
        self.movements.push(Movement {
            product_id,
            warehouse_id,
            kind,
            quantity,
            reference_type,
            reference_id,
        });
        let balance = self.balances.entry((product_id, warehouse_id)).or_default();
        *balance = apply_movement(*balance, kind, quantity);
        Ok(())
    }

    fn transfer(
        &mut self,
        product_id: Uuid,
        from: Uuid,
        to: Uuid,
        quantity: Decimal,
    ) -> Result<Uuid, &'static str> {
        if from == to {
            return Err("Source and destination warehouses must differ");
        }
        validate_quantity(quantity)?;
        if quantity > self.balance(product_id, from) {
            return Err("Insufficient stock");
        }
        let reference_id = Uuid::new_v4();
        self.apply(
            product_id,
            from,
            MovementKind::Out,
            quantity,
            Some(StockReference::Transfer),
            Some(reference_id),
        )?;
        self.apply(
            product_id,
            to,
            MovementKind::In,
            quantity,
            Some(StockReference::Transfer),
            Some(reference_id),
        )?;
        Ok(reference_id)
    }

    fn adjust_out(
        &mut self,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: Decimal,
    ) -> Result<(), &'static str> {
        validate_quantity(quantity)?;
        if quantity > self.balance(product_id, warehouse_id) {
            return Err("Insufficient stock");
        }
        self.apply(product_id, warehouse_id, MovementKind::Out, quantity, None, None)
    }

    /// Signed sum of the movement history for one pair
    fn history_sum(&self, product_id: Uuid, warehouse_id: Uuid) -> Decimal {
        let history: Vec<(MovementKind, Decimal)> = self
            .movements
            .iter()
            .filter(|m| m.product_id == product_id && m.warehouse_id == warehouse_id)
            .map(|m| (m.kind, m.quantity))
            .collect();
        signed_sum(&history)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_balance_reconciles_after_mixed_movements() {
        let product = Uuid::new_v4();
        let warehouse = Uuid::new_v4();
        let mut ledger = Ledger::default();

        ledger
            .apply(product, warehouse, MovementKind::In, dec("50.0"), None, None)
            .unwrap();
        ledger
            .apply(product, warehouse, MovementKind::In, dec("30.0"), None, None)
            .unwrap();
        ledger
            .apply(product, warehouse, MovementKind::Out, dec("20.0"), None, None)
            .unwrap();

        assert_eq!(ledger.balance(product, warehouse), dec("60.0"));
        assert_eq!(
            ledger.balance(product, warehouse),
            ledger.history_sum(product, warehouse)
        );
    }

    #[test]
    fn test_transfer_writes_exactly_one_pair() {
        let product = Uuid::new_v4();
        let source = Uuid::new_v4();
        let destination = Uuid::new_v4();
        let mut ledger = Ledger::default();
        ledger
            .apply(product, source, MovementKind::In, dec("100.0"), None, None)
            .unwrap();

        let reference_id = ledger
            .transfer(product, source, destination, dec("40.0"))
            .unwrap();

        let pair: Vec<&Movement> = ledger
            .movements
            .iter()
            .filter(|m| m.reference_id == Some(reference_id))
            .collect();

        assert_eq!(pair.len(), 2);
        assert_eq!(pair[0].kind, MovementKind::Out);
        assert_eq!(pair[0].warehouse_id, source);
        assert_eq!(pair[1].kind, MovementKind::In);
        assert_eq!(pair[1].warehouse_id, destination);
        assert_eq!(pair[0].quantity, pair[1].quantity);
        assert!(pair
            .iter()
            .all(|m| m.reference_type == Some(StockReference::Transfer)));

        assert_eq!(ledger.balance(product, source), dec("60.0"));
        assert_eq!(ledger.balance(product, destination), dec("40.0"));
    }

    #[test]
    fn test_transfer_preserves_system_wide_stock() {
        let product = Uuid::new_v4();
        let source = Uuid::new_v4();
        let destination = Uuid::new_v4();
        let mut ledger = Ledger::default();
        ledger
            .apply(product, source, MovementKind::In, dec("75.5"), None, None)
            .unwrap();

        let before = ledger.balance(product, source) + ledger.balance(product, destination);
        ledger
            .transfer(product, source, destination, dec("25.5"))
            .unwrap();
        let after = ledger.balance(product, source) + ledger.balance(product, destination);

        assert_eq!(before, after);
    }

    #[test]
    fn test_transfer_to_same_warehouse_writes_nothing() {
        let product = Uuid::new_v4();
        let warehouse = Uuid::new_v4();
        let mut ledger = Ledger::default();
        ledger
            .apply(product, warehouse, MovementKind::In, dec("10.0"), None, None)
            .unwrap();
        let movements_before = ledger.movements.len();

        let result = ledger.transfer(product, warehouse, warehouse, dec("5.0"));

        assert!(result.is_err());
        assert_eq!(ledger.movements.len(), movements_before);
        assert_eq!(ledger.balance(product, warehouse), dec("10.0"));
    }

    #[test]
    fn test_transfer_beyond_balance_writes_nothing() {
        let product = Uuid::new_v4();
        let source = Uuid::new_v4();
        let destination = Uuid::new_v4();
        let mut ledger = Ledger::default();
        ledger
            .apply(product, source, MovementKind::In, dec("10.0"), None, None)
            .unwrap();
        let movements_before = ledger.movements.len();

        let result = ledger.transfer(product, source, destination, dec("10.5"));

        assert!(result.is_err());
        assert_eq!(ledger.movements.len(), movements_before);
        assert_eq!(ledger.balance(product, source), dec("10.0"));
        assert_eq!(ledger.balance(product, destination), Decimal::ZERO);
    }

    #[test]
    fn test_manual_out_adjustment_checks_balance() {
        let product = Uuid::new_v4();
        let warehouse = Uuid::new_v4();
        let mut ledger = Ledger::default();
        ledger
            .apply(product, warehouse, MovementKind::In, dec("3.0"), None, None)
            .unwrap();

        assert!(ledger.adjust_out(product, warehouse, dec("4.0")).is_err());
        assert_eq!(ledger.balance(product, warehouse), dec("3.0"));

        assert!(ledger.adjust_out(product, warehouse, dec("3.0")).is_ok());
        assert_eq!(ledger.balance(product, warehouse), Decimal::ZERO);
    }

    #[test]
    fn test_zero_and_negative_quantities_rejected() {
        let product = Uuid::new_v4();
        let warehouse = Uuid::new_v4();
        let mut ledger = Ledger::default();

        assert!(ledger
            .apply(product, warehouse, MovementKind::In, Decimal::ZERO, None, None)
            .is_err());
        assert!(ledger
            .apply(product, warehouse, MovementKind::In, dec("-1.0"), None, None)
            .is_err());
        assert!(ledger.movements.is_empty());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating valid quantities (positive decimals)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1)) // 0.1 to 1000.0
    }

    fn kind_strategy() -> impl Strategy<Value = MovementKind> {
        prop_oneof![Just(MovementKind::In), Just(MovementKind::Out)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The materialized balance always equals the signed sum of the
        /// movement history for the pair
        #[test]
        fn prop_balance_equals_signed_sum(
            movements in prop::collection::vec((kind_strategy(), quantity_strategy()), 1..30)
        ) {
            let product = Uuid::new_v4();
            let warehouse = Uuid::new_v4();
            let mut ledger = Ledger::default();

            for (kind, quantity) in &movements {
                ledger.apply(product, warehouse, *kind, *quantity, None, None).unwrap();
            }

            prop_assert_eq!(
                ledger.balance(product, warehouse),
                ledger.history_sum(product, warehouse)
            );
        }

        /// Movements on one pair never affect another pair
        #[test]
        fn prop_pairs_are_independent(
            quantity_a in quantity_strategy(),
            quantity_b in quantity_strategy()
        ) {
            let product = Uuid::new_v4();
            let warehouse_a = Uuid::new_v4();
            let warehouse_b = Uuid::new_v4();
            let mut ledger = Ledger::default();

            ledger.apply(product, warehouse_a, MovementKind::In, quantity_a, None, None).unwrap();
            ledger.apply(product, warehouse_b, MovementKind::In, quantity_b, None, None).unwrap();

            prop_assert_eq!(ledger.balance(product, warehouse_a), quantity_a);
            prop_assert_eq!(ledger.balance(product, warehouse_b), quantity_b);
        }

        /// A transfer moves exactly Q: source loses Q, destination gains Q,
        /// the system-wide total stays fixed
        #[test]
        fn prop_transfer_conserves_stock(
            initial in quantity_strategy(),
            fraction in 1u32..=100
        ) {
            let product = Uuid::new_v4();
            let source = Uuid::new_v4();
            let destination = Uuid::new_v4();
            let mut ledger = Ledger::default();
            ledger.apply(product, source, MovementKind::In, initial, None, None).unwrap();

            let quantity = initial * Decimal::from(fraction) / Decimal::from(100u32);
            prop_assume!(quantity > Decimal::ZERO);

            ledger.transfer(product, source, destination, quantity).unwrap();

            prop_assert_eq!(ledger.balance(product, source), initial - quantity);
            prop_assert_eq!(ledger.balance(product, destination), quantity);
            prop_assert_eq!(
                ledger.balance(product, source) + ledger.balance(product, destination),
                initial
            );
        }

        /// A failed transfer never leaves a partial movement behind
        #[test]
        fn prop_failed_transfer_is_atomic(
            initial in quantity_strategy(),
            excess in quantity_strategy()
        ) {
            let product = Uuid::new_v4();
            let source = Uuid::new_v4();
            let destination = Uuid::new_v4();
            let mut ledger = Ledger::default();
            ledger.apply(product, source, MovementKind::In, initial, None, None).unwrap();
            let movements_before = ledger.movements.len();

            let result = ledger.transfer(product, source, destination, initial + excess);

            prop_assert!(result.is_err());
            prop_assert_eq!(ledger.movements.len(), movements_before);
            prop_assert_eq!(ledger.balance(product, source), initial);
        }
    }
}
