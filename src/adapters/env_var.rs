// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable settings source.

use crate::domain::Result;
use crate::ports::SettingSource;
use std::collections::HashMap;
use std::env;

/// Maximum length for environment variable keys (prevents DoS)
const MAX_ENV_KEY_LEN: usize = 512;

/// Maximum length for environment variable values (prevents DoS)
const MAX_ENV_VALUE_LEN: usize = 1048576; // 1MB

/// Default prefix for settings read from the environment.
pub const DEFAULT_ENV_PREFIX: &str = "PACKCFG_";

/// Settings source reading prefixed environment variables.
///
/// Only variables starting with the prefix are read. The prefix is stripped,
/// the rest is lowercased, and a double underscore separates sections, so
/// `PACKCFG_RETRY__MAX_ATTEMPTS` provides `retry.max_attempts`.
///
/// The environment is captured once, when the source is created.
///
/// # Priority
///
/// Environment variables have a priority of 2: they override settings files and
/// are overridden by explicit flags.
///
/// # Examples
///
/// ```rust
/// use packcfg::adapters::EnvVarSource;
/// use packcfg::ports::SettingSource;
///
/// std::env::set_var("DOCTEST_BROKER__HOST", "rabbit.internal");
/// let source = EnvVarSource::with_prefix("DOCTEST_");
/// assert_eq!(source.get("broker.host").unwrap().as_deref(), Some("rabbit.internal"));
/// ```
#[derive(Debug, Clone)]
pub struct EnvVarSource {
    prefix: String,
    values: HashMap<String, String>,
}

impl EnvVarSource {
    /// Creates a source reading variables prefixed with [`DEFAULT_ENV_PREFIX`].
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Creates a source reading variables with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let values = Self::load(&prefix, env::vars());
        Self { prefix, values }
    }

    /// Creates a source from explicit `(VARIABLE, value)` pairs instead of the
    /// process environment.
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let prefix = prefix.into();
        let vars = vars.into_iter().map(|(k, v)| (k.into(), v.into()));
        let values = Self::load(&prefix, vars);
        Self { prefix, values }
    }

    /// Returns the prefix in use.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Maps a variable name to a settings key, or `None` if it lacks the prefix.
    fn settings_key(prefix: &str, variable: &str) -> Option<String> {
        let stripped = variable.strip_prefix(prefix)?;
        if stripped.is_empty() {
            return None;
        }
        Some(stripped.to_lowercase().replace("__", "."))
    }

    fn load(prefix: &str, vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
        let mut values = HashMap::new();

        for (variable, value) in vars {
            if variable.len() > MAX_ENV_KEY_LEN || value.len() > MAX_ENV_VALUE_LEN {
                tracing::debug!(
                    "Skipping oversized environment variable: key_len={}, value_len={}",
                    variable.len(),
                    value.len()
                );
                continue;
            }

            if let Some(key) = Self::settings_key(prefix, &variable) {
                values.insert(key, value);
            }
        }

        tracing::debug!(
            "Loaded {} settings from environment (prefix={:?})",
            values.len(),
            prefix
        );
        values
    }
}

impl Default for EnvVarSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingSource for EnvVarSource {
    fn name(&self) -> &str {
        "env"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.values.keys().cloned().collect())
    }
}
