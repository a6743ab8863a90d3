// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit settings overrides.

use crate::domain::Result;
use crate::ports::SettingSource;
use std::collections::HashMap;

/// Settings source holding explicitly supplied values, typically parsed
/// command-line flags.
///
/// Overrides have the highest priority (3).
///
/// # Examples
///
/// ```rust
/// use packcfg::adapters::OverrideSource;
/// use packcfg::ports::SettingSource;
///
/// let source = OverrideSource::new()
///     .set("broker.host", "rabbit")
///     .set_opt("broker.port", None::<u16>);
/// assert_eq!(source.get("broker.host").unwrap().as_deref(), Some("rabbit"));
/// assert!(source.get("broker.port").unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OverrideSource {
    values: HashMap<String, String>,
}

impl OverrideSource {
    /// Creates an empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.values.insert(key.into(), value.to_string());
        self
    }

    /// Sets `key` only when `value` is present.
    pub fn set_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    /// Returns `true` if no overrides are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingSource for OverrideSource {
    fn name(&self) -> &str {
        "overrides"
    }

    fn priority(&self) -> u8 {
        3
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.values.keys().cloned().collect())
    }
}
