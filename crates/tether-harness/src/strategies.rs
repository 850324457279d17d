#![forbid(unsafe_code)]

//! `proptest` strategies.

use proptest::prelude::*;
use tether_core::Value;

/// Primitive (non-object) values, including `Null`.
pub fn primitive_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::Str),
    ]
}

/// Short display strings.
pub fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z ]{0,12}"
}

/// Property names as they appear in paths.
pub fn property_name() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9_]{0,8}"
}

/// A sequence of writes: `(text, toggle_connection)` pairs.
pub fn write_script(max: usize) -> impl Strategy<Value = Vec<(String, bool)>> {
    proptest::collection::vec((text(), any::<bool>()), 1..=max)
}
