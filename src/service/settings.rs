// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered process settings.
//!
//! Settings come from several [`SettingSource`]s. For each key the source with
//! the highest priority that has a value wins; keys nobody sets fall back to
//! built-in defaults.
//!
//! | key | default |
//! |---|---|
//! | `broker.host` | `127.0.0.1` |
//! | `broker.port` | `5672` |
//! | `broker.username` | `guest` |
//! | `broker.password` | `guest` |
//! | `broker.vhost` | `/` |
//! | `retry.max_attempts` | `10` |
//! | `retry.base_delay_ms` | `1000` |
//! | `retry.multiplier` | `2.0` |
//! | `retry.max_delay_ms` | `30000` |
//! | `crypto.key_path` | unset |
//! | `datastore.url` | unset (in-memory store) |
//! | `datastore.namespace` | `packcfg:` |

use crate::adapters::{InMemoryStore, OverrideSource};
use crate::domain::{BrokerConfig, PlatformError, Result};
use crate::ports::{SettingSource, Store};
use crate::service::{EncryptionGate, RetryPolicy};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Default key namespace in a shared datastore.
pub const DEFAULT_NAMESPACE: &str = "packcfg:";

const KNOWN_KEYS: &[&str] = &[
    "broker.host",
    "broker.port",
    "broker.username",
    "broker.password",
    "broker.vhost",
    "retry.max_attempts",
    "retry.base_delay_ms",
    "retry.multiplier",
    "retry.max_delay_ms",
    "crypto.key_path",
    "datastore.url",
    "datastore.namespace",
];

/// Encryption key settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CryptoSettings {
    /// File holding the base64 key; `None` leaves secrets unavailable
    pub key_path: Option<PathBuf>,
}

/// Datastore settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatastoreSettings {
    /// Redis URL; `None` keeps items in process memory
    pub url: Option<String>,
    /// Prefix applied to every key in the datastore
    pub namespace: String,
}

impl Default for DatastoreSettings {
    fn default() -> Self {
        Self {
            url: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

/// Resolved process settings.
///
/// # Examples
///
/// ```rust
/// use packcfg::adapters::OverrideSource;
/// use packcfg::service::Settings;
///
/// # fn main() -> packcfg::domain::Result<()> {
/// let settings = Settings::builder()
///     .with_overrides(OverrideSource::new().set("broker.host", "rabbit"))
///     .build()?;
///
/// assert_eq!(settings.broker.host, "rabbit");
/// assert_eq!(settings.broker.port, 5672);
/// assert_eq!(settings.retry.max_attempts(), 10);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Settings {
    /// Message broker connection
    pub broker: BrokerConfig,
    /// Bootstrap retry budget
    pub retry: RetryPolicy,
    /// Encryption key
    pub crypto: CryptoSettings,
    /// Config item storage
    pub datastore: DatastoreSettings,
}

impl Settings {
    /// Creates a settings builder.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Loads the encryption gate named by `crypto.key_path`.
    pub fn encryption_gate(&self) -> Result<EncryptionGate> {
        EncryptionGate::from_key_path(self.crypto.key_path.as_deref())
    }

    /// Opens the store named by `datastore.url`, or an in-memory store.
    pub fn open_store(&self) -> Result<Arc<dyn Store>> {
        match self.datastore.url.as_deref() {
            None => {
                tracing::info!("No datastore configured; config items are kept in memory");
                Ok(Arc::new(InMemoryStore::new()))
            }
            #[cfg(feature = "redis")]
            Some(url) => {
                let store = crate::adapters::RedisStore::new(url, &self.datastore.namespace)?;
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "redis"))]
            Some(_) => Err(PlatformError::InvalidSetting {
                key: "datastore.url".to_string(),
                message: "built without the `redis` feature".to_string(),
            }),
        }
    }
}

/// Builder collecting settings sources.
///
/// Sources may be added in any order; they are consulted by priority.
#[derive(Default)]
pub struct SettingsBuilder {
    sources: Vec<Box<dyn SettingSource>>,
}

impl SettingsBuilder {
    /// Creates a builder with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source.
    pub fn with_source(mut self, source: Box<dyn SettingSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Adds `PACKCFG_` environment variables.
    #[cfg(feature = "env")]
    pub fn with_env(self) -> Self {
        self.with_source(Box::new(crate::adapters::EnvVarSource::new()))
    }

    /// Adds environment variables with a custom prefix.
    #[cfg(feature = "env")]
    pub fn with_env_prefix(self, prefix: impl Into<String>) -> Self {
        self.with_source(Box::new(crate::adapters::EnvVarSource::with_prefix(prefix)))
    }

    /// Adds a YAML settings file. The file must exist.
    #[cfg(feature = "yaml")]
    pub fn with_yaml_file(self, path: impl AsRef<std::path::Path>) -> Result<Self> {
        let source = crate::adapters::YamlFileSource::from_file(path)?;
        Ok(self.with_source(Box::new(source)))
    }

    /// Adds the YAML settings file at the default location, if there is one.
    #[cfg(feature = "yaml")]
    pub fn with_default_yaml(self) -> Result<Self> {
        Ok(match crate::adapters::YamlFileSource::from_default_location()? {
            Some(source) => self.with_source(Box::new(source)),
            None => self,
        })
    }

    /// Adds explicit overrides. Empty overrides are ignored.
    pub fn with_overrides(self, overrides: OverrideSource) -> Self {
        if overrides.is_empty() {
            self
        } else {
            self.with_source(Box::new(overrides))
        }
    }

    /// Resolves every setting.
    ///
    /// # Errors
    ///
    /// `InvalidSetting` for a value that does not parse or is out of range.
    pub fn build(mut self) -> Result<Settings> {
        self.sources.sort_by_key(|s| std::cmp::Reverse(s.priority()));
        let layers = Layers {
            sources: &self.sources,
        };
        layers.warn_unknown_keys();

        let defaults = BrokerConfig::default();
        let broker = BrokerConfig {
            host: layers.string("broker.host", defaults.host)?,
            port: layers.parse("broker.port", defaults.port)?,
            username: layers.string("broker.username", defaults.username)?,
            password: layers.string("broker.password", defaults.password)?,
            vhost: layers.string("broker.vhost", defaults.vhost)?,
        };

        let default_retry = RetryPolicy::default();
        let retry = RetryPolicy::new(
            layers.parse("retry.max_attempts", default_retry.max_attempts())?,
            Duration::from_millis(
                layers.parse("retry.base_delay_ms", millis(default_retry.base_delay()))?,
            ),
            layers.parse("retry.multiplier", default_retry.multiplier())?,
            Duration::from_millis(
                layers.parse("retry.max_delay_ms", millis(default_retry.max_delay()))?,
            ),
        )?;

        let crypto = CryptoSettings {
            key_path: layers.optional("crypto.key_path")?.map(PathBuf::from),
        };

        let datastore = DatastoreSettings {
            url: layers.optional("datastore.url")?,
            namespace: layers.string("datastore.namespace", DEFAULT_NAMESPACE.to_string())?,
        };

        let settings = Settings {
            broker,
            retry,
            crypto,
            datastore,
        };
        tracing::debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Priority-ordered view over the sources.
struct Layers<'a> {
    sources: &'a [Box<dyn SettingSource>],
}

impl Layers<'_> {
    /// Returns the first value for `key`, highest priority first.
    ///
    /// A source that fails to answer is logged and skipped.
    fn raw(&self, key: &str) -> Option<(String, &str)> {
        for source in self.sources {
            match source.get(key) {
                Ok(Some(value)) => return Some((value, source.name())),
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(
                        "Error querying source '{}' for key '{}': {}",
                        source.name(),
                        key,
                        e
                    );
                }
            }
        }
        None
    }

    fn optional(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .raw(key)
            .map(|(value, _)| value)
            .filter(|value| !value.trim().is_empty()))
    }

    fn string(&self, key: &str, default: String) -> Result<String> {
        Ok(self.optional(key)?.unwrap_or(default))
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.raw(key) {
            None => Ok(default),
            Some((value, source)) => {
                value
                    .trim()
                    .parse::<T>()
                    .map_err(|e| PlatformError::InvalidSetting {
                        key: key.to_string(),
                        message: format!("'{}' from {}: {}", value, source, e),
                    })
            }
        }
    }

    fn warn_unknown_keys(&self) {
        for source in self.sources {
            let Ok(keys) = source.keys() else {
                continue;
            };
            for key in keys {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!("Ignoring unknown setting '{}' from {}", key, source.name());
                }
            }
        }
    }
}
