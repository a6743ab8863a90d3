// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store trait definition.
//!
//! This module defines the `Store` trait, the port through which config items
//! reach persistence. Adapters exist for an in-process map and for Redis; any
//! datastore with get/put/delete by key and prefix listing can back it.

use crate::domain::Result;

/// A trait for key-value persistence.
///
/// Keys and values are plain strings; the store knows nothing about packs or
/// encryption.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. One store instance is shared by every
/// in-flight request, so it must provide its own synchronization (or its
/// backing service must).
///
/// # Consistency
///
/// `put` overwrites unconditionally: concurrent writers to one key resolve as
/// last-write-wins. `delete` reports whether the key existed from the same
/// operation that removed it, so callers never need a read-before-delete.
///
/// # Examples
///
/// ```rust
/// use packcfg::domain::Result;
/// use packcfg::ports::Store;
///
/// struct NullStore;
///
/// impl Store for NullStore {
///     fn name(&self) -> &str {
///         "null"
///     }
///
///     fn get(&self, _key: &str) -> Result<Option<String>> {
///         Ok(None)
///     }
///
///     fn list(&self, _prefix: &str) -> Result<Vec<(String, String)>> {
///         Ok(vec![])
///     }
///
///     fn put(&self, _key: &str, _value: &str) -> Result<()> {
///         Ok(())
///     }
///
///     fn delete(&self, _key: &str) -> Result<bool> {
///         Ok(false)
///     }
/// }
/// ```
pub trait Store: Send + Sync {
    /// Returns a short name for logs and error messages, like `"memory"` or `"redis"`.
    fn name(&self) -> &str;

    /// Retrieves the value stored under `key`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(value))` - The key exists
    /// * `Ok(None)` - The key does not exist
    /// * `Err(PlatformError)` - The store could not be queried
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Returns every `(key, value)` pair whose key starts with `prefix`.
    ///
    /// Order is unspecified.
    fn list(&self, prefix: &str) -> Result<Vec<(String, String)>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The key existed and was removed
    /// * `Ok(false)` - The key did not exist
    /// * `Err(PlatformError)` - The store could not be modified
    fn delete(&self, key: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn Store>();
    }
}
