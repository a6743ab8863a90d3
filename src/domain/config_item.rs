// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config item types and storage key handling.
//!
//! This module provides [`ItemKey`], the validated `(pack, name)` pair that
//! addresses one config item, [`ConfigItem`], the plaintext view handed to
//! callers, and [`StoredValue`], the representation persisted in a store.

use crate::domain::errors::{PlatformError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the pack ref and the item name in a storage key.
pub const KEY_SEPARATOR: char = ':';

/// Maximum length of a config item name.
const MAX_NAME_LEN: usize = 255;

/// Validates a pack ref for use as a storage key prefix.
///
/// Refs are limited to ASCII alphanumerics, `-`, `_` and `.` so that the
/// separator and store-side match patterns stay unambiguous.
pub fn validate_pack_ref(pack_ref: &str) -> Result<()> {
    if pack_ref.is_empty() {
        return Err(PlatformError::InvalidKey {
            key: pack_ref.to_string(),
            reason: "pack ref is empty".to_string(),
        });
    }
    if let Some(c) = pack_ref
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(PlatformError::InvalidKey {
            key: pack_ref.to_string(),
            reason: format!("pack ref contains invalid character {:?}", c),
        });
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PlatformError::InvalidKey {
            key: name.to_string(),
            reason: "config item name is empty".to_string(),
        });
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(PlatformError::InvalidKey {
            key: name.to_string(),
            reason: format!("config item name exceeds {} characters", MAX_NAME_LEN),
        });
    }
    if name.chars().any(char::is_control) {
        return Err(PlatformError::InvalidKey {
            key: name.to_string(),
            reason: "config item name contains control characters".to_string(),
        });
    }
    Ok(())
}

/// The unique key of a config item: a pack ref and an item name.
///
/// # Examples
///
/// ```
/// use packcfg::domain::ItemKey;
///
/// let key = ItemKey::new("aws", "region").unwrap();
/// assert_eq!(key.storage_key(), "aws:region");
///
/// let parsed = ItemKey::from_storage_key("aws:region").unwrap();
/// assert_eq!(parsed, key);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pack: String,
    name: String,
}

impl ItemKey {
    /// Creates a validated key.
    pub fn new(pack: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let pack = pack.into();
        let name = name.into();
        validate_pack_ref(&pack)?;
        validate_name(&name)?;
        Ok(ItemKey { pack, name })
    }

    /// Parses a storage key of the form `pack:name`.
    ///
    /// The pack ref never contains the separator, so everything after the first
    /// separator is the name.
    pub fn from_storage_key(storage_key: &str) -> Result<Self> {
        let (pack, name) =
            storage_key
                .split_once(KEY_SEPARATOR)
                .ok_or_else(|| PlatformError::InvalidKey {
                    key: storage_key.to_string(),
                    reason: "missing pack separator".to_string(),
                })?;
        Self::new(pack, name)
    }

    /// Returns the store prefix shared by every item of `pack_ref`.
    pub fn pack_prefix(pack_ref: &str) -> Result<String> {
        validate_pack_ref(pack_ref)?;
        Ok(format!("{}{}", pack_ref, KEY_SEPARATOR))
    }

    /// Returns the pack ref.
    pub fn pack(&self) -> &str {
        &self.pack
    }

    /// Returns the item name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the key as stored.
    pub fn storage_key(&self) -> String {
        format!("{}{}{}", self.pack, KEY_SEPARATOR, self.name)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.pack, KEY_SEPARATOR, self.name)
    }
}

/// A config item as returned to callers; secret values are in plaintext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    /// Canonical pack ref owning the item
    pub pack: String,
    /// Item name, unique within the pack
    pub name: String,
    /// Plaintext value
    pub value: String,
    /// Whether the value is encrypted at rest
    pub secret: bool,
}

impl ConfigItem {
    /// Creates a config item from its key and plaintext value.
    pub fn new(key: &ItemKey, value: impl Into<String>, secret: bool) -> Self {
        ConfigItem {
            pack: key.pack().to_string(),
            name: key.name().to_string(),
            value: value.into(),
            secret,
        }
    }
}

/// The persisted form of a config item.
///
/// For secret items `value` holds ciphertext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredValue {
    /// Plaintext, or ciphertext when `secret` is set
    pub value: String,
    /// Whether `value` is ciphertext
    #[serde(default)]
    pub secret: bool,
}

impl StoredValue {
    /// Encodes the value for a store.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| PlatformError::ParseError {
            message: format!("Failed to encode stored value: {}", e),
            source: Some(Box::new(e)),
        })
    }

    /// Decodes a value read from `store` under `key`.
    pub fn decode(store: &str, key: &str, raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| PlatformError::StoreError {
            store: store.to_string(),
            message: format!("Malformed stored value for key '{}': {}", key, e),
            source: Some(Box::new(e)),
        })
    }
}
