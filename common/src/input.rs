//! Untyped values arriving from the UI boundary.

use std::fmt;

/// A value handed in by a dynamically typed caller.
///
/// Everything the dashboard can pass as an amount or currency code maps to
/// exactly one variant, so validation can reject each shape explicitly
/// instead of coercing it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// No value was supplied at all.
    Missing,
    /// An explicit null.
    Null,
    Number(f64),
    Text(String),
    Bool(bool),
    BigInt(i128),
    Object,
    Array,
    Function,
    Symbol,
}

impl RawValue {
    /// Type label as reported in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Missing => "undefined",
            RawValue::Null => "null",
            RawValue::Number(_) => "number",
            RawValue::Text(_) => "string",
            RawValue::Bool(_) => "boolean",
            RawValue::BigInt(_) => "bigint",
            RawValue::Object | RawValue::Array => "object",
            RawValue::Function => "function",
            RawValue::Symbol => "symbol",
        }
    }

    /// Borrow the string payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Text(s) => write!(f, "{s:?}"),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::BigInt(n) => write!(f, "{n}n"),
            other => write!(f, "{}", other.type_name()),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<f32> for RawValue {
    fn from(value: f32) -> Self {
        RawValue::Number(f64::from(value))
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Number(f64::from(value))
    }
}

impl From<u32> for RawValue {
    fn from(value: u32) -> Self {
        RawValue::Number(f64::from(value))
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Missing)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Object),
            Value::String(s) => RawValue::Text(s),
            Value::Array(_) => RawValue::Array,
            Value::Object(_) => RawValue::Object,
        }
    }
}
