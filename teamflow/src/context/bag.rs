//! The context accumulator passed through a team run.

use super::ContextValue;
use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A string-keyed bag of results accumulated over one pipeline run.
///
/// Keys are only ever added or overwritten, never removed. The bag is owned
/// by exactly one run at a time and is not synchronized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    entries: BTreeMap<String, ContextValue>,
}

impl Context {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Serialization` if the value is not an object
    /// of supported context values.
    pub fn from_json(value: serde_json::Value) -> Result<Self, PipelineError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Adds an entry, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Gets a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    /// Sets a value, overwriting any previous value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns all keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the context is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `needle` occurs in any key or value.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.entries
            .iter()
            .any(|(k, v)| k.contains(needle) || v.mentions(needle))
    }

    /// Renders the context as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or_default()))
                .collect(),
        )
    }

    /// Gets a value a stage depends on.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingDependency` naming `stage` if absent.
    pub fn require(&self, stage: &str, key: &str) -> Result<&ContextValue, PipelineError> {
        self.get(key)
            .ok_or_else(|| PipelineError::missing_dependency(stage, key))
    }

    /// Gets a text value a stage depends on.
    ///
    /// # Errors
    ///
    /// Returns `MissingDependency` if absent, `UnexpectedType` if not text.
    pub fn require_text(&self, stage: &str, key: &str) -> Result<&str, PipelineError> {
        let value = self.require(stage, key)?;
        value
            .as_text()
            .ok_or_else(|| PipelineError::unexpected_type(stage, key, "a string", value.kind_name()))
    }

    /// Gets a list value a stage depends on.
    ///
    /// # Errors
    ///
    /// Returns `MissingDependency` if absent, `UnexpectedType` if not a list.
    pub fn require_list(&self, stage: &str, key: &str) -> Result<&[String], PipelineError> {
        let value = self.require(stage, key)?;
        value
            .as_list()
            .ok_or_else(|| PipelineError::unexpected_type(stage, key, "a list", value.kind_name()))
    }

    /// Gets a mapping value a stage depends on.
    ///
    /// # Errors
    ///
    /// Returns `MissingDependency` if absent, `UnexpectedType` if not a mapping.
    pub fn require_map(
        &self,
        stage: &str,
        key: &str,
    ) -> Result<&BTreeMap<String, ContextValue>, PipelineError> {
        let value = self.require(stage, key)?;
        value
            .as_map()
            .ok_or_else(|| PipelineError::unexpected_type(stage, key, "a mapping", value.kind_name()))
    }
}

impl<K: Into<String>, V: Into<ContextValue>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Context {
    type Item = (String, ContextValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, ContextValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
