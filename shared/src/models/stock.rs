//! Stock ledger primitives: movement direction and reference tagging

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    In,
    Out,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::In => "in",
            MovementKind::Out => "out",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MovementKind::In),
            "out" => Some(MovementKind::Out),
            _ => None,
        }
    }

    /// The signed balance delta this movement applies for a positive quantity
    pub fn signed(&self, quantity: Decimal) -> Decimal {
        match self {
            MovementKind::In => quantity,
            MovementKind::Out => -quantity,
        }
    }
}

/// Operation a stock movement originates from. Manual adjustments carry
/// no reference at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockReference {
    Sale,
    Order,
    Purchase,
    Transfer,
    Adjust,
}

impl StockReference {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockReference::Sale => "sale",
            StockReference::Order => "order",
            StockReference::Purchase => "purchase",
            StockReference::Transfer => "transfer",
            StockReference::Adjust => "adjust",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sale" => Some(StockReference::Sale),
            "order" => Some(StockReference::Order),
            "purchase" => Some(StockReference::Purchase),
            "transfer" => Some(StockReference::Transfer),
            "adjust" => Some(StockReference::Adjust),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn signed_delta_matches_direction() {
        let qty = Decimal::new(75, 1); // 7.5
        assert_eq!(MovementKind::In.signed(qty), qty);
        assert_eq!(MovementKind::Out.signed(qty), -qty);
    }

    #[test]
    fn reference_round_trips_through_strings() {
        for r in [
            StockReference::Sale,
            StockReference::Order,
            StockReference::Purchase,
            StockReference::Transfer,
            StockReference::Adjust,
        ] {
            assert_eq!(StockReference::from_str(r.as_str()), Some(r));
        }
        assert_eq!(StockReference::from_str("return"), None);
    }
}
