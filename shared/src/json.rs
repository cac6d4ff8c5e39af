//! Loose JSON helpers for assistant output and analytics payloads
//!
//! Assistant output is free-form, so both components judge presence with
//! JavaScript-style truthiness rather than with `Option` alone.

use serde_json::{Map, Value};

/// JavaScript-style truthiness of a JSON value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Copy the fields of `extra` over `base`, like an object spread
///
/// Non-object values contribute nothing.
pub fn spread(mut base: Map<String, Value>, extra: &Value) -> Map<String, Value> {
    if let Value::Object(fields) = extra {
        for (key, value) in fields {
            base.insert(key.clone(), value.clone());
        }
    }
    base
}
