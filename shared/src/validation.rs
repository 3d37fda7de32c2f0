//! Business rules shared by the order, sale, stock, and money modules.
//!
//! Everything here is pure arithmetic over `rust_decimal::Decimal` so the
//! ledger invariants can be tested without a database. Floating point is
//! never used for money or quantities.

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::models::{MovementKind, PaymentStatus};

/// Validate that a stock quantity is strictly positive
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate that a money amount is strictly positive
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Amount must be positive");
    }
    Ok(())
}

/// Computed totals for an order or sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

/// Compute subtotal and total from line items.
///
/// subtotal = sum(quantity * unit_price); total = subtotal - discount +
/// delivery_fee. The discount may not be negative or exceed the subtotal.
pub fn compute_totals(
    lines: &[(Decimal, Decimal)],
    discount: Decimal,
    delivery_fee: Decimal,
) -> Result<DocumentTotals, &'static str> {
    if discount < Decimal::ZERO {
        return Err("Discount cannot be negative");
    }
    if delivery_fee < Decimal::ZERO {
        return Err("Delivery fee cannot be negative");
    }

    let subtotal: Decimal = lines.iter().map(|(qty, price)| qty * price).sum();

    if discount > subtotal {
        return Err("Discount cannot exceed the subtotal");
    }

    Ok(DocumentTotals {
        subtotal,
        discount,
        delivery_fee,
        total: subtotal - discount + delivery_fee,
    })
}

/// Apply one movement to a balance: IN adds, OUT subtracts
pub fn apply_movement(balance: Decimal, kind: MovementKind, quantity: Decimal) -> Decimal {
    balance + kind.signed(quantity)
}

/// Signed sum of a movement history; a materialized balance must always
/// reconcile against this
pub fn signed_sum<'a, I>(movements: I) -> Decimal
where
    I: IntoIterator<Item = &'a (MovementKind, Decimal)>,
{
    movements
        .into_iter()
        .fold(Decimal::ZERO, |acc, (kind, qty)| {
            apply_movement(acc, *kind, *qty)
        })
}

/// Whether one more payment fits under the document total
pub fn payment_fits(total: Decimal, already_paid: Decimal, amount: Decimal) -> bool {
    already_paid + amount <= total
}

/// Payment status after the recorded payments sum to `paid`
pub fn settle_payment_status(total: Decimal, paid: Decimal) -> PaymentStatus {
    if paid >= total && total > Decimal::ZERO {
        PaymentStatus::Paid
    } else if paid > Decimal::ZERO {
        PaymentStatus::Pending
    } else {
        PaymentStatus::Open
    }
}

/// Merge contract for per-company settings: provided keys overwrite stored
/// keys, absent keys persist, and an explicit JSON `null` deletes the key.
pub fn shallow_merge(stored: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        if value.is_null() {
            stored.remove(&key);
        } else {
            stored.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn totals_subtract_discount_and_add_delivery() {
        let lines = [(dec("2"), dec("30.0")), (dec("1"), dec("40.0"))];
        let totals = compute_totals(&lines, dec("10.0"), dec("5.0")).unwrap();
        assert_eq!(totals.subtotal, dec("100.0"));
        assert_eq!(totals.total, dec("95.0"));
    }

    #[test]
    fn discount_larger_than_subtotal_is_rejected() {
        let lines = [(dec("1"), dec("50.0"))];
        assert!(compute_totals(&lines, dec("60.0"), Decimal::ZERO).is_err());
        assert!(compute_totals(&lines, dec("-1.0"), Decimal::ZERO).is_err());
    }

    #[test]
    fn balance_reconciles_against_signed_sum() {
        let history = [
            (MovementKind::In, dec("50.0")),
            (MovementKind::In, dec("30.0")),
            (MovementKind::Out, dec("20.0")),
            (MovementKind::In, dec("10.0")),
            (MovementKind::Out, dec("15.0")),
        ];

        let mut balance = Decimal::ZERO;
        for (kind, qty) in &history {
            balance = apply_movement(balance, *kind, *qty);
        }

        assert_eq!(balance, dec("55.0"));
        assert_eq!(balance, signed_sum(&history));
    }

    #[test]
    fn payment_cap_is_inclusive() {
        let total = dec("90.0");
        assert!(payment_fits(total, dec("60.0"), dec("30.0")));
        assert!(!payment_fits(total, dec("60.0"), dec("60.0")));
    }

    #[test]
    fn payment_status_settles_by_paid_sum() {
        let total = dec("90.0");
        assert_eq!(
            settle_payment_status(total, Decimal::ZERO),
            PaymentStatus::Open
        );
        assert_eq!(
            settle_payment_status(total, dec("60.0")),
            PaymentStatus::Pending
        );
        assert_eq!(
            settle_payment_status(total, dec("90.0")),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn shallow_merge_overwrites_keeps_and_deletes() {
        let mut stored = serde_json::from_value::<Map<String, Value>>(json!({
            "currency": "USD",
            "receipt_footer": "Thanks!",
            "low_stock_threshold": 5
        }))
        .unwrap();

        let patch = serde_json::from_value::<Map<String, Value>>(json!({
            "currency": "EUR",
            "receipt_footer": null,
            "tax_rate": "7.5"
        }))
        .unwrap();

        shallow_merge(&mut stored, patch);

        assert_eq!(stored.get("currency"), Some(&json!("EUR")));
        assert_eq!(stored.get("receipt_footer"), None);
        assert_eq!(stored.get("low_stock_threshold"), Some(&json!(5)));
        assert_eq!(stored.get("tax_rate"), Some(&json!("7.5")));
    }
}
