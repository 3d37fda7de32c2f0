//! Company settings tests
//!
//! The merge-on-update contract: a patch shallow-merges over the stored
//! map: provided keys overwrite, absent keys persist, explicit nulls
//! delete.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use shared::validation::shallow_merge;

fn map(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_provided_keys_overwrite() {
        let mut stored = map(json!({"currency": "USD", "tax_rate": "7.0"}));
        shallow_merge(&mut stored, map(json!({"currency": "EUR"})));

        assert_eq!(stored.get("currency"), Some(&json!("EUR")));
        assert_eq!(stored.get("tax_rate"), Some(&json!("7.0")));
    }

    #[test]
    fn test_absent_keys_persist() {
        let mut stored = map(json!({"receipt_footer": "Thanks!"}));
        shallow_merge(&mut stored, map(json!({"currency": "USD"})));

        assert_eq!(stored.len(), 2);
        assert_eq!(stored.get("receipt_footer"), Some(&json!("Thanks!")));
    }

    #[test]
    fn test_null_deletes_key() {
        let mut stored = map(json!({"currency": "USD", "receipt_footer": "Thanks!"}));
        shallow_merge(&mut stored, map(json!({"receipt_footer": null})));

        assert_eq!(stored.len(), 1);
        assert!(!stored.contains_key("receipt_footer"));
    }

    #[test]
    fn test_merge_is_shallow_not_deep() {
        let mut stored = map(json!({"notifications": {"email": true, "sms": true}}));
        shallow_merge(&mut stored, map(json!({"notifications": {"email": false}})));

        // The nested object is replaced wholesale, not merged
        assert_eq!(
            stored.get("notifications"),
            Some(&json!({"email": false}))
        );
    }

    #[test]
    fn test_empty_patch_is_a_no_op() {
        let mut stored = map(json!({"currency": "USD"}));
        let before = stored.clone();
        shallow_merge(&mut stored, Map::new());

        assert_eq!(stored, before);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn key_strategy() -> impl Strategy<Value = String> {
        "[a-z_]{1,12}"
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            "[a-zA-Z0-9 ]{0,16}".prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
        ]
    }

    fn map_strategy() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map(key_strategy(), value_strategy(), 0..8)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// After a merge, every non-null patch key holds the patch value
        /// and every untouched stored key is unchanged
        #[test]
        fn prop_merge_contract(stored in map_strategy(), patch in map_strategy()) {
            let original = stored.clone();
            let mut merged = stored;
            shallow_merge(&mut merged, patch.clone());

            for (key, value) in &patch {
                if value.is_null() {
                    prop_assert!(!merged.contains_key(key));
                } else {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }

            for (key, value) in &original {
                if !patch.contains_key(key) {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }
        }

        /// Applying the same patch twice gives the same map as applying it
        /// once
        #[test]
        fn prop_merge_is_idempotent(stored in map_strategy(), patch in map_strategy()) {
            let mut once = stored.clone();
            shallow_merge(&mut once, patch.clone());

            let mut twice = stored;
            shallow_merge(&mut twice, patch.clone());
            shallow_merge(&mut twice, patch);

            prop_assert_eq!(once, twice);
        }
    }
}
