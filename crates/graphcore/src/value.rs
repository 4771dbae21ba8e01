use crate::NodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dynamic value flowing between nodes and into run results.
///
/// Serialized untagged so results read as plain JSON scalars.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

/// Numeric view of a value used by arithmetic nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Integer(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Integer(i) => Value::Integer(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Json(_) => "json",
        }
    }

    /// Interpret the value as a number.
    ///
    /// The editor submits parameter fields as strings, so numeric strings
    /// are accepted. Booleans count as 0/1.
    pub fn to_number(&self, field: &str) -> Result<Number, NodeError> {
        match self {
            Value::Integer(i) => Ok(Number::Integer(*i)),
            Value::Float(f) => Ok(Number::Float(*f)),
            Value::Bool(b) => Ok(Number::Integer(i64::from(*b))),
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    Ok(Number::Integer(i))
                } else if let Ok(f) = trimmed.parse::<f64>() {
                    Ok(Number::Float(f))
                } else {
                    Err(self.type_error(field, "number"))
                }
            }
            Value::Null | Value::Json(_) => Err(self.type_error(field, "number")),
        }
    }

    /// Interpret the value as an integer, truncating floats.
    pub fn to_i64(&self, field: &str) -> Result<i64, NodeError> {
        match self {
            Value::Integer(i) => Ok(*i),
            Value::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| self.type_error(field, "int")),
            _ => Err(self.type_error(field, "int")),
        }
    }

    fn type_error(&self, field: &str, expected: &str) -> NodeError {
        NodeError::InvalidInputType {
            field: field.to_string(),
            expected: expected.to_string(),
            actual: self.type_name().to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::Json(j) => write!(f, "{}", j),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Integer(0)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<serde_json::Value> for Value {
    fn from(j: serde_json::Value) -> Self {
        match j {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Value::String(s),
            other => Value::Json(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_strings_coerce() {
        assert_eq!(Value::from("7").to_number("a"), Ok(Number::Integer(7)));
        assert_eq!(Value::from(" 2.5 ").to_number("a"), Ok(Number::Float(2.5)));
        assert!(Value::from("seven").to_number("a").is_err());
    }

    #[test]
    fn null_is_not_a_number() {
        let err = Value::Null.to_number("b").unwrap_err();
        assert_eq!(
            err,
            NodeError::InvalidInputType {
                field: "b".to_string(),
                expected: "number".to_string(),
                actual: "null".to_string(),
            }
        );
    }

    #[test]
    fn to_i64_truncates_floats() {
        assert_eq!(Value::Float(5.9).to_i64("value"), Ok(5));
        assert_eq!(Value::from("12").to_i64("value"), Ok(12));
        assert!(Value::from("1.5").to_i64("value").is_err());
    }

    #[test]
    fn json_conversion_keeps_integers_distinct() {
        assert_eq!(Value::from(json!(3)), Value::Integer(3));
        assert_eq!(Value::from(json!(3.5)), Value::Float(3.5));
        assert_eq!(Value::from(json!([1, 2])), Value::Json(json!([1, 2])));
    }

    #[test]
    fn serializes_untagged() {
        assert_eq!(serde_json::to_value(Value::Integer(12)).unwrap(), json!(12));
        assert_eq!(serde_json::to_value(Value::Float(0.5)).unwrap(), json!(0.5));
        assert_eq!(serde_json::to_value(Value::Null).unwrap(), json!(null));
    }
}
