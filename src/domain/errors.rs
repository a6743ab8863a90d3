// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the pack configuration and bootstrap crate.
//!
//! Every failure the core can produce is a variant of [`PlatformError`]. Store and
//! encryption failures travel unchanged up to the controller, which maps each
//! variant onto a status code; bootstrap failures decide whether a retry is worth
//! spending.

use thiserror::Error;

/// The main error type for pack configuration and topology operations.
///
/// Marked `#[non_exhaustive]` so new failure kinds can be added without breaking
/// callers that match on it.
///
/// # Examples
///
/// ```
/// use packcfg::domain::errors::PlatformError;
///
/// fn lookup(pack: &str) -> Result<(), PlatformError> {
///     Err(PlatformError::PackNotFound {
///         pack_ref_or_id: pack.to_string(),
///     })
/// }
///
/// assert!(lookup("core").is_err());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlatformError {
    /// No pack resolves for the given ref or id.
    #[error("Pack with ref_or_id \"{pack_ref_or_id}\" does not exist")]
    PackNotFound {
        /// The ref or id that failed to resolve
        pack_ref_or_id: String,
    },

    /// The requested config item does not exist in the store.
    #[error("Config item \"{name}\" not found for pack \"{pack}\"")]
    KeyNotFound {
        /// Canonical pack ref
        pack: String,
        /// Config item name
        name: String,
    },

    /// A secret value was read or written but no encryption key was ever loaded.
    #[error("Crypto key not provisioned: cannot {operation} secret value")]
    KeyNotProvisioned {
        /// `"encrypt"` or `"decrypt"`
        operation: &'static str,
    },

    /// Ciphertext failed authentication (wrong key or tampered payload).
    #[error("Failed to decrypt secret value: {message}")]
    DecryptionFailed {
        /// The error message
        message: String,
    },

    /// Ciphertext is structurally invalid (bad encoding or truncated).
    #[error("Corrupt ciphertext: {message}")]
    CorruptCiphertext {
        /// The error message
        message: String,
    },

    /// Encryption key material exists but cannot be used.
    #[error("Invalid crypto key material: {message}")]
    InvalidKeyMaterial {
        /// The error message
        message: String,
    },

    /// A request body could not be decoded or failed validation.
    #[error("Invalid request body: {message}")]
    InvalidRequestBody {
        /// The error message
        message: String,
        /// The underlying decoding error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A pack ref or config item name is not usable as a storage key.
    #[error("Invalid config key \"{key}\": {reason}")]
    InvalidKey {
        /// The offending key component
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// A pack could not be registered.
    #[error("Invalid pack: {message}")]
    InvalidPack {
        /// The error message
        message: String,
    },

    /// An exchange exists (or is requested) with parameters that disagree.
    #[error("Exchange \"{exchange}\" topology mismatch: {message}")]
    TopologyMismatch {
        /// The exchange name
        exchange: String,
        /// The error message
        message: String,
    },

    /// The broker could not be reached or dropped the connection.
    #[error("Message broker unavailable: {message}")]
    BrokerUnavailable {
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The broker refused the session for a non-transient reason.
    #[error("Message broker rejected the request: {message}")]
    BrokerRejected {
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A retried operation failed on every attempt.
    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Name of the operation that was retried
        operation: String,
        /// Number of attempts made
        attempts: u32,
        /// The error from the final attempt
        source: Box<PlatformError>,
    },

    /// An error occurred in a backing store.
    #[error("Store '{store}' error: {message}")]
    StoreError {
        /// The name of the store that encountered the error
        store: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A setting is present but cannot be used.
    #[error("Invalid setting '{key}': {message}")]
    InvalidSetting {
        /// The setting key
        key: String,
        /// The error message
        message: String,
    },

    /// Failed to parse a settings file.
    #[error("Failed to parse settings: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PlatformError {
    /// Creates a `StoreError` without an underlying cause.
    pub fn store(store: impl Into<String>, message: impl Into<String>) -> Self {
        PlatformError::StoreError {
            store: store.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a `BrokerUnavailable` error without an underlying cause.
    pub fn broker_unavailable(message: impl Into<String>) -> Self {
        PlatformError::BrokerUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an `InvalidRequestBody` error without an underlying cause.
    pub fn invalid_body(message: impl Into<String>) -> Self {
        PlatformError::InvalidRequestBody {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` if the operation that produced this error may succeed on a
    /// later attempt.
    ///
    /// Only an unreachable broker qualifies. A topology mismatch is a
    /// configuration bug and a rejected login will be rejected again.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlatformError::BrokerUnavailable { .. })
    }
}

/// A specialized Result type for pack configuration operations.
pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_not_found_error() {
        let error = PlatformError::PackNotFound {
            pack_ref_or_id: "linux".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Pack with ref_or_id \"linux\" does not exist"
        );
    }

    #[test]
    fn test_key_not_provisioned_error() {
        let error = PlatformError::KeyNotProvisioned {
            operation: "decrypt",
        };
        assert_eq!(
            error.to_string(),
            "Crypto key not provisioned: cannot decrypt secret value"
        );
    }

    #[test]
    fn test_store_error() {
        let error = PlatformError::store("memory", "lock poisoned");
        assert_eq!(error.to_string(), "Store 'memory' error: lock poisoned");
    }

    #[test]
    fn test_retries_exhausted_keeps_last_error() {
        let error = PlatformError::RetriesExhausted {
            operation: "register exchanges".to_string(),
            attempts: 3,
            source: Box::new(PlatformError::broker_unavailable("connection refused")),
        };
        let text = error.to_string();
        assert!(text.contains("after 3 attempts"));
        assert!(text.contains("connection refused"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_only_broker_unavailable_is_transient() {
        assert!(PlatformError::broker_unavailable("reset").is_transient());
        assert!(!PlatformError::TopologyMismatch {
            exchange: "execution".to_string(),
            message: "kind differs".to_string(),
        }
        .is_transient());
        assert!(!PlatformError::BrokerRejected {
            message: "ACCESS_REFUSED".to_string(),
            source: None,
        }
        .is_transient());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = PlatformError::from(io_error);
        assert!(matches!(error, PlatformError::IoError(_)));
    }
}
