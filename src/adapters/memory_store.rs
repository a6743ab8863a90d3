// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process key-value store adapter.

use crate::domain::{PlatformError, Result};
use crate::ports::Store;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// A `Store` backed by a map held in process memory.
///
/// Used when no datastore URL is configured, and as the store in tests.
/// Contents are lost when the process exits.
///
/// # Examples
///
/// ```rust
/// use packcfg::adapters::InMemoryStore;
/// use packcfg::ports::Store;
///
/// let store = InMemoryStore::new();
/// store.put("aws:region", "us-east-1").unwrap();
/// assert_eq!(store.get("aws:region").unwrap().as_deref(), Some("us-east-1"));
/// assert!(store.delete("aws:region").unwrap());
/// assert!(!store.delete("aws:region").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns `true` if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> PlatformError {
        PlatformError::store("memory", "store lock poisoned by a panicked writer")
    }
}

impl Store for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn list(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        Ok(entries.remove(key).is_some())
    }
}
