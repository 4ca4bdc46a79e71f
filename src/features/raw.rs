//! Raw Input - Untyped request values
//!
//! Demultiplexed key/value view of a request, independent of transport.
//! Query parameters always arrive as text, JSON bodies may already be typed.

use std::collections::HashMap;

use serde_json::Value;

/// One untyped scalar from the request
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Key absent or explicit null
    Absent,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Array or object; never coercible
    Nested,
}

impl RawValue {
    /// Present means non-null and, for text, non-blank
    pub fn is_present(&self) -> bool {
        match self {
            RawValue::Absent => false,
            RawValue::Text(s) => !s.trim().is_empty(),
            _ => true,
        }
    }

    /// Short description for error messages
    pub fn describe(&self) -> String {
        match self {
            RawValue::Absent => "null".to_string(),
            RawValue::Text(s) => format!("\"{}\"", s),
            RawValue::Number(n) => n.to_string(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Nested => "a nested structure".to_string(),
        }
    }
}

impl From<&Value> for RawValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => RawValue::Absent,
            Value::Bool(b) => RawValue::Bool(*b),
            // serde_json numbers without arbitrary_precision always fit f64
            Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Nested),
            Value::String(s) => RawValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => RawValue::Nested,
        }
    }
}

/// Feature name → raw value. Superfluous keys are kept but ignored by assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInput {
    values: HashMap<String, RawValue>,
}

impl RawInput {
    /// Missing keys read as `Absent`
    pub fn get(&self, name: &str) -> &RawValue {
        self.values.get(name).unwrap_or(&RawValue::Absent)
    }

    /// From URL query parameters; every value is text
    pub fn from_query(params: HashMap<String, String>) -> Self {
        let values = params
            .into_iter()
            .map(|(k, v)| (k, RawValue::Text(v)))
            .collect();
        Self { values }
    }

    /// From a parsed JSON object. Returns `None` when the body is not an object.
    pub fn from_json(body: &Value) -> Option<Self> {
        let object = body.as_object()?;
        let values = object
            .iter()
            .map(|(k, v)| (k.clone(), RawValue::from(v)))
            .collect();
        Some(Self { values })
    }
}
