use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A flag, property, or stat value.
///
/// Serialized untagged so scenario files can write plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    /// A text value.
    String(String),
    /// A 64-bit signed integer value.
    Integer(i64),
    /// A 64-bit floating-point value.
    Float(f64),
    /// A boolean value.
    Boolean(bool),
    /// An ordered list of values.
    List(Vec<FlagValue>),
    /// A string-keyed map of values.
    Map(BTreeMap<String, FlagValue>),
}

impl FlagValue {
    /// Returns the boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl Default for FlagValue {
    fn default() -> Self {
        Self::Boolean(true)
    }
}

impl From<bool> for FlagValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for FlagValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<&str> for FlagValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Map(_) => write!(f, "{{...}}"),
        }
    }
}

/// Named values keyed by string, kept ordered for stable serialization.
pub type Flags = BTreeMap<String, FlagValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_json_scalars() {
        let v: FlagValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, FlagValue::Boolean(true));
        let v: FlagValue = serde_json::from_str("3").unwrap();
        assert_eq!(v, FlagValue::Integer(3));
        let v: FlagValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(v, FlagValue::Float(2.5));
        let v: FlagValue = serde_json::from_str("\"open\"").unwrap();
        assert_eq!(v, FlagValue::String("open".to_string()));
    }

    #[test]
    fn string_true_is_not_boolean_true() {
        let v: FlagValue = serde_json::from_str("\"true\"").unwrap();
        assert_ne!(v, FlagValue::Boolean(true));
    }

    #[test]
    fn display_list() {
        let v = FlagValue::List(vec![1.into(), "a".into()]);
        assert_eq!(v.to_string(), "[1, a]");
    }
}
