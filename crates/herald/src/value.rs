//! Runtime value types for herald templates.

use crate::error::{HeraldError, Result};
use serde_json::Value as JsonValue;
use indexmap::IndexMap;

/// Runtime value type for template data
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Convert a JSON value into a template value
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(arr) => Value::Array(arr.into_iter().map(Value::from_json).collect()),
            JsonValue::Object(obj) => Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Truthiness used by `if`, `unless` and `each`.
    /// Falsy values: false, null, 0, "", []
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(arr) => !arr.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Stringify the value for output.
    /// Null renders as the empty string; arrays and objects cannot be output.
    pub fn stringify(&self) -> Result<String> {
        match self {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Integer(n) => Ok(n.to_string()),
            Value::Float(n) => Ok(format_float(*n)),
            Value::String(s) => Ok(s.clone()),
            Value::Array(_) => Err(HeraldError::TypeError {
                message: "Cannot stringify array".to_string(),
            }),
            Value::Object(_) => Err(HeraldError::TypeError {
                message: "Cannot stringify object".to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Value::from_json(json)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

/// Whole floats print without a fractional part (`3.0` -> `3`).
fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthy() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Integer(-1).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::String("".to_string()).is_truthy());
        assert!(Value::String("hello".to_string()).is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(Value::Object(IndexMap::new()).is_truthy());
    }

    #[test]
    fn test_stringify() {
        assert_eq!(Value::from("hello").stringify().unwrap(), "hello");
        assert_eq!(Value::Integer(-42).stringify().unwrap(), "-42");
        assert_eq!(Value::Float(12.5).stringify().unwrap(), "12.5");
        assert_eq!(Value::Float(3.0).stringify().unwrap(), "3");
        assert_eq!(Value::Bool(true).stringify().unwrap(), "true");
        assert_eq!(Value::Null.stringify().unwrap(), "");
        assert!(Value::Array(vec![]).stringify().is_err());
        assert!(Value::Object(IndexMap::new()).stringify().is_err());
    }

    #[test]
    fn test_from_json() {
        let value = Value::from_json(json!({"name": "test", "count": 42, "ratio": 0.25}));
        let obj = value.as_object().expect("object");
        assert_eq!(obj.get("name"), Some(&Value::from("test")));
        assert_eq!(obj.get("count"), Some(&Value::Integer(42)));
        assert_eq!(obj.get("ratio"), Some(&Value::Float(0.25)));
    }

    #[test]
    fn test_from_json_keeps_key_order() {
        let value = Value::from_json(json!({"z": 1, "a": 2, "m": 3}));
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
