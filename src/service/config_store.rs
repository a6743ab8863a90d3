// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encryption-aware config item storage.
//!
//! [`ConfigStore`] is the only path between callers and a [`Store`]: secret
//! values are sealed on the way in and opened on the way out, so plaintext of a
//! secret item never reaches the backing store.

use crate::domain::{ConfigItem, ItemKey, PlatformError, Result, StoredValue};
use crate::ports::Store;
use crate::service::EncryptionGate;
use std::sync::Arc;

/// Reads and writes config items of a pack through an [`EncryptionGate`].
///
/// Cheap to clone; clones share the store and the gate.
///
/// # Examples
///
/// ```rust
/// use packcfg::adapters::InMemoryStore;
/// use packcfg::domain::ItemKey;
/// use packcfg::service::{ConfigStore, EncryptionGate};
/// use std::sync::Arc;
///
/// # fn main() -> packcfg::domain::Result<()> {
/// let store = ConfigStore::new(
///     Arc::new(InMemoryStore::new()),
///     Arc::new(EncryptionGate::unprovisioned()),
/// );
///
/// let key = ItemKey::new("aws", "region")?;
/// store.put(&key, "us-east-1", false)?;
/// assert_eq!(store.require(&key)?.value, "us-east-1");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConfigStore {
    store: Arc<dyn Store>,
    gate: Arc<EncryptionGate>,
}

impl ConfigStore {
    /// Creates a config store over `store`, encrypting through `gate`.
    pub fn new(store: Arc<dyn Store>, gate: Arc<EncryptionGate>) -> Self {
        Self { store, gate }
    }

    /// Returns the encryption gate in use.
    pub fn gate(&self) -> &EncryptionGate {
        &self.gate
    }

    /// Returns every item of `pack_ref`, sorted by name, with secrets decrypted.
    ///
    /// A pack without items yields an empty list. If any one secret cannot be
    /// decrypted the whole listing fails; values are never partially returned.
    pub fn list_for_pack(&self, pack_ref: &str) -> Result<Vec<ConfigItem>> {
        let prefix = ItemKey::pack_prefix(pack_ref)?;
        let entries = self.store.list(&prefix)?;

        let mut items = Vec::with_capacity(entries.len());
        for (storage_key, raw) in entries {
            let key = ItemKey::from_storage_key(&storage_key)?;
            items.push(self.open(&key, &raw)?);
        }
        items.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!(
            "Listed {} config items for pack '{}' from store '{}'",
            items.len(),
            pack_ref,
            self.store.name()
        );
        Ok(items)
    }

    /// Returns one item if it exists, with its secret value decrypted.
    pub fn get_one(&self, key: &ItemKey) -> Result<Option<ConfigItem>> {
        match self.store.get(&key.storage_key())? {
            Some(raw) => self.open(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Like [`get_one`](Self::get_one), but a missing item is an error.
    ///
    /// # Errors
    ///
    /// * `KeyNotFound` - The item does not exist
    /// * `KeyNotProvisioned` / `DecryptionFailed` - A secret value cannot be opened
    pub fn require(&self, key: &ItemKey) -> Result<ConfigItem> {
        self.get_one(key)?.ok_or_else(|| not_found(key))
    }

    /// Creates or replaces an item and returns it as stored, in plaintext.
    ///
    /// Nothing is written when a secret value cannot be encrypted.
    pub fn put(&self, key: &ItemKey, value: &str, secret: bool) -> Result<ConfigItem> {
        let stored = self.gate.protect(value, secret)?;
        self.store.put(&key.storage_key(), &stored.encode()?)?;

        tracing::debug!(
            "Stored config item '{}' (secret={}) in store '{}'",
            key,
            secret,
            self.store.name()
        );
        Ok(ConfigItem::new(key, value, secret))
    }

    /// Removes an item.
    ///
    /// # Errors
    ///
    /// * `KeyNotFound` - The item did not exist
    pub fn delete(&self, key: &ItemKey) -> Result<()> {
        if !self.store.delete(&key.storage_key())? {
            return Err(not_found(key));
        }
        tracing::debug!("Deleted config item '{}' from store '{}'", key, self.store.name());
        Ok(())
    }

    fn open(&self, key: &ItemKey, raw: &str) -> Result<ConfigItem> {
        let stored = StoredValue::decode(self.store.name(), &key.storage_key(), raw)?;
        let value = self.gate.reveal(&stored)?;
        Ok(ConfigItem::new(key, value, stored.secret))
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("store", &self.store.name())
            .field("gate", &self.gate)
            .finish()
    }
}

fn not_found(key: &ItemKey) -> PlatformError {
    PlatformError::KeyNotFound {
        pack: key.pack().to_string(),
        name: key.name().to_string(),
    }
}
