//! Placeholder parameters and the live store read during playback.
//!
//! [`ParameterSet`] is a plain value. [`ParameterStore`] is a shared handle to
//! one: the playback engine holds a clone of the handle and re-reads it right
//! before each message is resolved, so edits made mid-playback show up in
//! messages that have not been emitted yet.

use std::collections::HashMap;
use std::collections::hash_map;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::template;

/// Mapping from placeholder name to its current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: HashMap<String, String>,
}

impl ParameterSet {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Invalid names are ignored.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.set(name, value);
        self
    }

    /// Set a value, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the name is empty or contains a brace.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> CoreResult<Option<String>> {
        let name = name.into();
        validate_name(&name)?;
        Ok(self.values.insert(name, value.into()))
    }

    /// Remove a value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns `true` if a value is set for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.values.iter()
    }

    /// Parameter names sorted for stable display.
    #[must_use]
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |set, (k, v)| set.with(k, v))
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a String, &'a String);
    type IntoIter = hash_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

fn validate_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::EmptyParameterName);
    }
    if name.contains(['{', '}']) {
        return Err(CoreError::InvalidParameterName(name.to_owned()));
    }
    Ok(())
}

/// Shared, live handle to a [`ParameterSet`].
///
/// Cloning creates a new handle to the same underlying set (via `Arc`).
/// The operator-facing layer writes through one handle while the playback
/// engine reads through another.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    inner: Arc<RwLock<ParameterSet>>,
}

impl ParameterStore {
    /// Create a store seeded with `initial`.
    #[must_use]
    pub fn new(initial: ParameterSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Set a parameter, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the name is empty or contains a brace.
    pub async fn set(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> CoreResult<Option<String>> {
        self.inner.write().await.set(name, value)
    }

    /// Current value of a parameter.
    pub async fn get(&self, name: &str) -> Option<String> {
        self.inner.read().await.get(name).map(ToOwned::to_owned)
    }

    /// Copy of the current parameter set.
    pub async fn snapshot(&self) -> ParameterSet {
        self.inner.read().await.clone()
    }

    /// Resolve `text` against the parameters as they are right now.
    pub async fn resolve(&self, text: Option<&str>) -> String {
        let guard = self.inner.read().await;
        template::resolve(text, &guard)
    }
}
