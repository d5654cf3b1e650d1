//! Values stored in a pipeline context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single context value.
///
/// Values are deliberately limited to the shapes stages exchange: text,
/// booleans, ordered string sequences and nested mappings. Serialized
/// untagged, so a context renders as plain JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    /// A string value.
    Text(String),
    /// A boolean value.
    Flag(bool),
    /// An ordered sequence of strings.
    List(Vec<String>),
    /// A nested string-keyed mapping.
    Map(BTreeMap<String, ContextValue>),
}

impl ContextValue {
    /// Builds a mapping value from key/value pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ContextValue>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds a list value from anything that yields strings.
    pub fn list<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Human-readable name of the value's kind, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "a string",
            Self::Flag(_) => "a boolean",
            Self::List(_) => "a list",
            Self::Map(_) => "a mapping",
        }
    }

    /// Returns the string, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a flag.
    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries, if this is a mapping.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, ContextValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns true if `needle` occurs anywhere in this value.
    ///
    /// Strings are matched by substring; mapping keys are searched as well
    /// as mapping values.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        match self {
            Self::Text(s) => s.contains(needle),
            Self::Flag(_) => false,
            Self::List(items) => items.iter().any(|item| item.contains(needle)),
            Self::Map(entries) => entries
                .iter()
                .any(|(k, v)| k.contains(needle) || v.mentions(needle)),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Vec<String>> for ContextValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, ContextValue>> for ContextValue {
    fn from(value: BTreeMap<String, ContextValue>) -> Self {
        Self::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_untagged_serialization() {
        let value = ContextValue::map([
            ("status", ContextValue::from("sent")),
            ("ok", ContextValue::from(true)),
            ("recipients", ContextValue::list(["a", "b"])),
        ]);

        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ok": true, "recipients": ["a", "b"], "status": "sent"})
        );
    }

    #[test]
    fn test_deserialize_each_kind() {
        let text: ContextValue = serde_json::from_str("\"hi\"").unwrap();
        let flag: ContextValue = serde_json::from_str("false").unwrap();
        let list: ContextValue = serde_json::from_str("[\"x\"]").unwrap();
        let map: ContextValue = serde_json::from_str("{\"k\": [\"v\"]}").unwrap();

        assert_eq!(text.as_text(), Some("hi"));
        assert_eq!(flag.as_flag(), Some(false));
        assert_eq!(list.as_list().map(<[String]>::len), Some(1));
        assert!(map.as_map().unwrap().contains_key("k"));
    }

    #[test]
    fn test_numbers_are_rejected() {
        assert!(serde_json::from_str::<ContextValue>("42").is_err());
    }

    #[test]
    fn test_mentions_searches_nested_values() {
        let value = ContextValue::map([(
            "inner",
            ContextValue::map([("client", ContextValue::from("Acme Clinic onboarded"))]),
        )]);

        assert!(value.mentions("Acme Clinic"));
        assert!(value.mentions("inner"));
        assert!(!value.mentions("Other Clinic"));
        assert!(!ContextValue::Flag(true).mentions("true"));
    }
}
