//! Attribute value union for generic port attribute access.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload for the generic get/set port-attribute operations.
///
/// The `List` variant carries multi-valued reads such as the port's VLAN
/// membership list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Unsigned integer payload (speeds, frame sizes, ...).
    Number(u64),
    /// Textual payload (states, identifiers, addresses).
    Text(String),
    /// Boolean payload (autonegotiation flag).
    Flag(bool),
    /// List-of-strings payload (VLAN membership).
    List(Vec<String>),
}

impl AttributeValue {
    /// Returns the numeric payload, if this value is a number.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the textual payload, if this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this value is a flag.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AttributeValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the list payload, if this value is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttributeValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Name of the contained variant, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Number(_) => "number",
            AttributeValue::Text(_) => "text",
            AttributeValue::Flag(_) => "flag",
            AttributeValue::List(_) => "list",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Flag(b) => write!(f, "{}", b),
            AttributeValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<u64> for AttributeValue {
    fn from(n: u64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<u32> for AttributeValue {
    fn from(n: u32) -> Self {
        AttributeValue::Number(n.into())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Flag(b)
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(items: Vec<String>) -> Self {
        AttributeValue::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_accessors() {
        assert_eq!(AttributeValue::Number(10).as_number(), Some(10));
        assert_eq!(AttributeValue::Number(10).as_flag(), None);
        assert_eq!(AttributeValue::Flag(true).as_flag(), Some(true));
        assert_eq!(AttributeValue::from("Up").as_text(), Some("Up"));

        let list = AttributeValue::from(vec!["1".to_string(), "100".to_string()]);
        assert_eq!(list.as_list().unwrap().len(), 2);
        assert_eq!(list.as_number(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(AttributeValue::Number(9000).to_string(), "9000");
        assert_eq!(AttributeValue::Flag(false).to_string(), "false");
        assert_eq!(
            AttributeValue::List(vec!["1".into(), "7".into()]).to_string(),
            "1,7"
        );
    }

    #[test]
    fn test_kind() {
        assert_eq!(AttributeValue::Number(0).kind(), "number");
        assert_eq!(AttributeValue::Flag(true).kind(), "flag");
    }
}
