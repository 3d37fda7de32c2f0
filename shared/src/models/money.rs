//! Money ledger primitives: cash direction, reference tagging, payment methods

use serde::{Deserialize, Serialize};

/// Direction of a money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoneyKind {
    In,
    Out,
}

impl MoneyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoneyKind::In => "in",
            MoneyKind::Out => "out",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MoneyKind::In),
            "out" => Some(MoneyKind::Out),
            _ => None,
        }
    }
}

/// Operation a money movement originates from. Manual entries carry no
/// reference; `Other` marks an entry linked to something outside the
/// system and stays freely editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyReference {
    Sale,
    Order,
    Purchase,
    CashSession,
    Other,
}

impl MoneyReference {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoneyReference::Sale => "sale",
            MoneyReference::Order => "order",
            MoneyReference::Purchase => "purchase",
            MoneyReference::CashSession => "cash_session",
            MoneyReference::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sale" => Some(MoneyReference::Sale),
            "order" => Some(MoneyReference::Order),
            "purchase" => Some(MoneyReference::Purchase),
            "cash_session" => Some(MoneyReference::CashSession),
            "other" => Some(MoneyReference::Other),
            _ => None,
        }
    }

    /// System-owned entries can only be removed by reversing the operation
    /// that created them, never edited or deleted directly.
    pub fn is_protected(reference: Option<MoneyReference>) -> bool {
        matches!(
            reference,
            Some(
                MoneyReference::Sale
                    | MoneyReference::Order
                    | MoneyReference::Purchase
                    | MoneyReference::CashSession
            )
        )
    }
}

/// Payment method for order/sale payments and money movements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            "transfer" => Some(PaymentMethod::Transfer),
            "other" => Some(PaymentMethod::Other),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_references_are_protected() {
        assert!(MoneyReference::is_protected(Some(MoneyReference::Sale)));
        assert!(MoneyReference::is_protected(Some(MoneyReference::Order)));
        assert!(MoneyReference::is_protected(Some(MoneyReference::Purchase)));
        assert!(MoneyReference::is_protected(Some(
            MoneyReference::CashSession
        )));
    }

    #[test]
    fn manual_and_other_entries_are_editable() {
        assert!(!MoneyReference::is_protected(None));
        assert!(!MoneyReference::is_protected(Some(MoneyReference::Other)));
    }
}
