// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pack identity.

use crate::domain::config_item::validate_pack_ref;
use crate::domain::errors::{PlatformError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pack: a named unit of the platform owning its own configuration namespace.
///
/// A pack is addressable by two forms, its human-readable `pack_ref` and its
/// internal `id`. The `pack_ref` is the canonical identity used to scope config
/// items in the store.
///
/// # Examples
///
/// ```
/// use packcfg::domain::Pack;
///
/// let pack = Pack::new("5f1c0a", "linux").unwrap();
/// assert_eq!(pack.pack_ref(), "linux");
/// assert_eq!(pack.id(), "5f1c0a");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pack {
    id: String,
    #[serde(rename = "ref")]
    pack_ref: String,
}

impl Pack {
    /// Creates a pack, validating that the ref can scope storage keys.
    pub fn new(id: impl Into<String>, pack_ref: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let pack_ref = pack_ref.into();

        if id.is_empty() {
            return Err(PlatformError::InvalidPack {
                message: format!("pack \"{}\" has an empty id", pack_ref),
            });
        }
        validate_pack_ref(&pack_ref)?;

        Ok(Self { id, pack_ref })
    }

    /// Returns the internal id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the canonical ref.
    pub fn pack_ref(&self) -> &str {
        &self.pack_ref
    }

    /// Returns `true` if `ref_or_id` addresses this pack by either form.
    pub fn is_addressed_by(&self, ref_or_id: &str) -> bool {
        self.pack_ref == ref_or_id || self.id == ref_or_id
    }
}

impl fmt::Display for Pack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.pack_ref, self.id)
    }
}
