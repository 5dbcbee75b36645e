//! Tolerant readers for typed values in a `serde_json::Value` params object.
//!
//! A missing key or a value of the wrong JSON type yields the default, so
//! hosts can pass partial option objects.

use serde_json::Value;

static NULL: Value = Value::Null;

/// Reads an `f64`, accepting any JSON number. Non-finite results fall back to `default`.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params
        .get(name)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// Reads a non-negative integer as `usize`.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// Reads a non-negative integer as `u64`.
pub fn param_u64(params: &Value, name: &str, default: u64) -> u64 {
    params.get(name).and_then(Value::as_u64).unwrap_or(default)
}

/// Reads a string slice, if present and a string.
pub fn param_str<'a>(params: &'a Value, name: &str) -> Option<&'a str> {
    params.get(name).and_then(Value::as_str)
}

/// Reads a nested object, returning `Value::Null` when absent so that
/// nested lookups fall through to their defaults.
pub fn param_object<'a>(params: &'a Value, name: &str) -> &'a Value {
    params
        .get(name)
        .filter(|v| v.is_object())
        .unwrap_or(&NULL)
}
