//! Money ledger tests
//!
//! The protected-record rule: entries created by a sale, order, purchase,
//! or cash session can only be neutralized by reversing the originating
//! operation, never edited or deleted directly.

use proptest::prelude::*;

use shared::models::MoneyReference;

/// Mirror of the service-side gate: direct edits are allowed only for
/// manual entries and entries tagged `other`
fn direct_edit_allowed(reference: Option<MoneyReference>) -> bool {
    !MoneyReference::is_protected(reference)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_sale_owned_entries_are_immutable() {
        assert!(!direct_edit_allowed(Some(MoneyReference::Sale)));
    }

    #[test]
    fn test_all_system_origins_are_immutable() {
        for reference in [
            MoneyReference::Sale,
            MoneyReference::Order,
            MoneyReference::Purchase,
            MoneyReference::CashSession,
        ] {
            assert!(
                !direct_edit_allowed(Some(reference)),
                "{} entries must be protected",
                reference.as_str()
            );
        }
    }

    #[test]
    fn test_manual_entries_are_editable() {
        assert!(direct_edit_allowed(None));
    }

    #[test]
    fn test_other_entries_are_editable() {
        assert!(direct_edit_allowed(Some(MoneyReference::Other)));
    }

    /// Stored reference strings round trip through the enum, so the gate
    /// sees the same origin the writer recorded
    #[test]
    fn test_reference_strings_round_trip() {
        for reference in [
            MoneyReference::Sale,
            MoneyReference::Order,
            MoneyReference::Purchase,
            MoneyReference::CashSession,
            MoneyReference::Other,
        ] {
            assert_eq!(
                MoneyReference::from_str(reference.as_str()),
                Some(reference)
            );
        }
        assert_eq!(MoneyReference::from_str("refund"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn reference_strategy() -> impl Strategy<Value = Option<MoneyReference>> {
        prop_oneof![
            Just(None),
            Just(Some(MoneyReference::Sale)),
            Just(Some(MoneyReference::Order)),
            Just(Some(MoneyReference::Purchase)),
            Just(Some(MoneyReference::CashSession)),
            Just(Some(MoneyReference::Other)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The gate is exactly the complement of "system-owned": editable
        /// iff the reference is absent or `other`
        #[test]
        fn prop_edit_gate_matches_ownership(reference in reference_strategy()) {
            let editable = direct_edit_allowed(reference);
            let expected = matches!(reference, None | Some(MoneyReference::Other));
            prop_assert_eq!(editable, expected);
        }
    }
}
