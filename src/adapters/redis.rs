// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redis key-value store adapter.
//!
//! This module provides a `Store` that keeps each config item in its own Redis
//! string key below a namespace prefix.

use crate::domain::{PlatformError, Result};
use crate::ports::Store;
use redis::{Client, Commands, Connection};

/// `Store` adapter for Redis.
///
/// Every key is written as `{namespace}{key}`. Listing walks the keyspace with
/// `SCAN ... MATCH` so a large datastore never blocks the server the way
/// `KEYS` would.
///
/// # Examples
///
/// ```rust,no_run
/// use packcfg::adapters::RedisStore;
/// use packcfg::ports::Store;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = RedisStore::new("redis://localhost:6379", "packcfg:")?;
/// store.put("aws:region", "{\"value\":\"us-east-1\",\"secret\":false}")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RedisStore {
    /// Redis client
    client: Client,
    /// Key prefix applied to every key
    namespace: String,
}

impl RedisStore {
    /// Validates namespace to prevent pattern injection into `SCAN MATCH`
    fn validate_namespace(namespace: &str) -> Result<()> {
        if namespace.contains(['*', '?', '[', ']', '\\']) {
            return Err(PlatformError::store(
                "redis",
                "Namespace contains invalid characters (* ? [ ] \\)",
            ));
        }
        Ok(())
    }

    /// Creates a Redis store and checks that the server answers.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., `"redis://localhost:6379"`)
    /// * `namespace` - Prefix for every key written by this store
    pub fn new(url: &str, namespace: &str) -> Result<Self> {
        Self::validate_namespace(namespace)?;

        let client = Client::open(url).map_err(|e| Self::error("Failed to create Redis client", e))?;

        let store = Self {
            client,
            namespace: namespace.to_string(),
        };

        let mut conn = store.connection()?;
        redis::cmd("PING")
            .query::<String>(&mut conn)
            .map_err(|e| Self::error("Redis did not answer PING", e))?;

        tracing::info!("Connected to Redis store (namespace={:?})", store.namespace);
        Ok(store)
    }

    /// Returns the namespace prefix.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn error(context: &str, e: redis::RedisError) -> PlatformError {
        PlatformError::StoreError {
            store: "redis".to_string(),
            message: format!("{}: {}", context, e),
            source: Some(Box::new(e)),
        }
    }

    fn connection(&self) -> Result<Connection> {
        self.client
            .get_connection()
            .map_err(|e| Self::error("Failed to connect to Redis", e))
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }
}

impl Store for RedisStore {
    fn name(&self) -> &str {
        "redis"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection()?;
        conn.get(self.full_key(key))
            .map_err(|e| Self::error("Failed to fetch value from Redis", e))
    }

    fn list(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        Self::validate_namespace(prefix)?;

        let mut conn = self.connection()?;
        let pattern = format!("{}*", self.full_key(prefix));
        let mut cursor: u64 = 0;
        let mut all_keys = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query(&mut conn)
                .map_err(|e| Self::error("Failed to scan keys from Redis", e))?;

            all_keys.extend(keys);
            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        let mut entries = Vec::with_capacity(all_keys.len());
        for full_key in all_keys {
            // A key deleted between SCAN and GET is simply skipped
            let value: Option<String> = conn
                .get(&full_key)
                .map_err(|e| Self::error("Failed to fetch value from Redis", e))?;

            if let (Some(value), Some(key)) = (value, full_key.strip_prefix(&self.namespace)) {
                entries.push((key.to_string(), value));
            }
        }

        tracing::debug!("Listed {} keys under prefix {:?}", entries.len(), prefix);
        Ok(entries)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection()?;
        conn.set(self.full_key(key), value)
            .map_err(|e| Self::error("Failed to store value in Redis", e))
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection()?;
        let removed: i64 = conn
            .del(self.full_key(key))
            .map_err(|e| Self::error("Failed to delete value from Redis", e))?;
        Ok(removed > 0)
    }
}
