// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process pack registry adapter.

use crate::domain::{Pack, PlatformError, Result};
use crate::ports::PackLookup;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Indexes {
    by_ref: HashMap<String, Pack>,
    ref_by_id: HashMap<String, String>,
}

/// A `PackLookup` holding packs in memory, indexed by ref and by id.
///
/// A lookup consults the ref index, then the id index. Registration refuses any
/// pack whose ref or id is already claimed by another pack in either form, so a
/// `ref_or_id` can never resolve to two packs.
///
/// # Examples
///
/// ```rust
/// use packcfg::adapters::InMemoryPackRegistry;
/// use packcfg::domain::Pack;
/// use packcfg::ports::PackLookup;
///
/// let registry = InMemoryPackRegistry::new();
/// registry.register(Pack::new("5f1c0a", "linux").unwrap()).unwrap();
///
/// let by_ref = registry.find_by_ref_or_id("linux").unwrap().unwrap();
/// let by_id = registry.find_by_ref_or_id("5f1c0a").unwrap().unwrap();
/// assert_eq!(by_ref, by_id);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryPackRegistry {
    indexes: RwLock<Indexes>,
}

impl InMemoryPackRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding `packs`.
    pub fn with_packs(packs: impl IntoIterator<Item = Pack>) -> Result<Self> {
        let registry = Self::new();
        for pack in packs {
            registry.register(pack)?;
        }
        Ok(registry)
    }

    /// Adds a pack.
    ///
    /// Re-registering an identical pack is a no-op.
    pub fn register(&self, pack: Pack) -> Result<()> {
        let mut indexes = self.indexes.write().map_err(|_| Self::poisoned())?;

        if indexes.by_ref.get(pack.pack_ref()) == Some(&pack) {
            return Ok(());
        }

        for claimed in [pack.pack_ref(), pack.id()] {
            if indexes.by_ref.contains_key(claimed) || indexes.ref_by_id.contains_key(claimed) {
                return Err(PlatformError::InvalidPack {
                    message: format!(
                        "cannot register {}: \"{}\" already addresses another pack",
                        pack, claimed
                    ),
                });
            }
        }

        tracing::debug!("Registered pack {}", pack);
        indexes
            .ref_by_id
            .insert(pack.id().to_string(), pack.pack_ref().to_string());
        indexes.by_ref.insert(pack.pack_ref().to_string(), pack);
        Ok(())
    }

    /// Returns the number of registered packs.
    pub fn len(&self) -> usize {
        self.indexes.read().map(|i| i.by_ref.len()).unwrap_or(0)
    }

    /// Returns `true` if no packs are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> PlatformError {
        PlatformError::store("pack-registry", "registry lock poisoned by a panicked writer")
    }
}

impl PackLookup for InMemoryPackRegistry {
    fn find_by_ref_or_id(&self, ref_or_id: &str) -> Result<Option<Pack>> {
        let indexes = self.indexes.read().map_err(|_| Self::poisoned())?;

        let pack_ref = if indexes.by_ref.contains_key(ref_or_id) {
            Some(ref_or_id)
        } else {
            indexes.ref_by_id.get(ref_or_id).map(String::as_str)
        };

        Ok(pack_ref.and_then(|r| indexes.by_ref.get(r)).cloned())
    }
}
