// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML file settings source.

use crate::domain::{PlatformError, Result};
use crate::ports::SettingSource;
use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum allowed file size for YAML settings files (10MB)
const MAX_YAML_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Settings source reading a YAML file.
///
/// Nested mappings are flattened into dot notation:
///
/// ```yaml
/// broker:
///   host: rabbit
///   port: 5672
/// ```
///
/// provides `broker.host` and `broker.port`.
///
/// # Priority
///
/// Settings files have a priority of 1, the lowest.
///
/// # Examples
///
/// ```rust
/// use packcfg::adapters::YamlFileSource;
/// use packcfg::ports::SettingSource;
///
/// let source = YamlFileSource::from_str("retry:\n  max_attempts: 3\n").unwrap();
/// assert_eq!(source.get("retry.max_attempts").unwrap().as_deref(), Some("3"));
/// ```
#[derive(Debug, Clone)]
pub struct YamlFileSource {
    file_path: Option<PathBuf>,
    values: HashMap<String, String>,
}

impl YamlFileSource {
    /// Reads settings from the file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();
        let shown = file_path.display().to_string();

        let metadata = fs::metadata(&file_path).map_err(|e| PlatformError::ParseError {
            message: format!("Failed to read settings file metadata: {}", shown),
            source: Some(Box::new(e)),
        })?;

        if metadata.len() > MAX_YAML_FILE_SIZE {
            return Err(PlatformError::ParseError {
                message: format!(
                    "Settings file too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    MAX_YAML_FILE_SIZE
                ),
                source: None,
            });
        }

        let content = fs::read_to_string(&file_path)?;
        let mut source = Self::from_str(&content)?;
        tracing::debug!("Loaded {} settings from {}", source.values.len(), shown);
        source.file_path = Some(file_path);
        Ok(source)
    }

    /// Reads settings from YAML text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| PlatformError::ParseError {
                message: format!("Failed to parse YAML: {}", e),
                source: Some(Box::new(e)),
            })?;

        let mut values = HashMap::new();
        flatten_yaml(&value, "", &mut values);
        Ok(Self {
            file_path: None,
            values,
        })
    }

    /// Returns the default settings file path for this OS, such as
    /// `~/.config/packcfg/config.yaml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "", "packcfg").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Reads the default settings file if it exists.
    ///
    /// Returns `Ok(None)` when there is no default file; a file that exists but
    /// cannot be parsed is still an error.
    pub fn from_default_location() -> Result<Option<Self>> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(path).map(Some),
            _ => Ok(None),
        }
    }

    /// Returns the path the settings were read from, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}

/// Flattens a YAML value into a flat map with dot notation keys.
fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, result: &mut HashMap<String, String>) {
    let scalar = match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, val) in map {
                if let Some(key_str) = key.as_str() {
                    let new_prefix = if prefix.is_empty() {
                        key_str.to_string()
                    } else {
                        format!("{}.{}", prefix, key_str)
                    };
                    flatten_yaml(val, &new_prefix, result);
                }
            }
            return;
        }
        serde_yaml::Value::Sequence(seq) => {
            for (i, val) in seq.iter().enumerate() {
                flatten_yaml(val, &format!("{}.{}", prefix, i), result);
            }
            return;
        }
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Tagged(tagged) => return flatten_yaml(&tagged.value, prefix, result),
    };
    result.insert(prefix.to_string(), scalar);
}

impl SettingSource for YamlFileSource {
    fn name(&self) -> &str {
        "yaml-file"
    }

    fn priority(&self) -> u8 {
        1
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.values.keys().cloned().collect())
    }
}
