//! Property-based test generators using proptest.
//!
//! Values are restricted to integers, strings, booleans and nulls (nested in
//! arrays and objects) so that equality after a store round trip is exact.

use lawnstore_core::Record;
use lawnstore_engine::{Key, Value};
use proptest::prelude::*;
use serde_json::json;

/// Strategy for keys of either kind.
pub fn key_strategy() -> impl Strategy<Value = Key> {
    prop_oneof![
        any::<i64>().prop_map(Key::Int),
        "[a-z0-9-]{1,12}".prop_map(Key::Text),
    ]
}

/// Strategy for JSON payloads up to a small nesting depth.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[ -~]{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Strategy for records that carry a key.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    (key_strategy(), value_strategy()).prop_map(|(key, data)| Record::with_key(key, data))
}

/// Strategy for records without a key.
pub fn keyless_record_strategy() -> impl Strategy<Value = Record> {
    value_strategy().prop_map(Record::new)
}

/// Strategy for records with pairwise distinct keys.
pub fn distinct_records_strategy(
    size: impl Into<prop::collection::SizeRange>,
) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::btree_map(key_strategy(), value_strategy(), size).prop_map(|map| {
        map.into_iter()
            .map(|(key, data)| Record::with_key(key, data))
            .collect()
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
