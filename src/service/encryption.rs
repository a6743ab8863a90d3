// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encryption of secret config values.
//!
//! Secret values are sealed with AES-256-GCM. The stored form is base64 of a
//! 12-byte random nonce followed by the ciphertext and its 16-byte tag.

use crate::domain::{PlatformError, Result, StoredValue};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::fmt;
use std::fs;
use std::path::Path;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Routes secret values through AES-256-GCM.
///
/// The gate is either provisioned with a key or not. An unprovisioned gate
/// still passes plain values through, but any attempt to seal or open a secret
/// fails with `PlatformError::KeyNotProvisioned` rather than producing an empty
/// or garbage value.
///
/// The key is fixed at construction, so one gate can be shared by concurrent
/// requests without locking.
///
/// # Examples
///
/// ```
/// use packcfg::service::EncryptionGate;
///
/// let key = EncryptionGate::generate_base64_key();
/// let gate = EncryptionGate::from_base64_key(&key).unwrap();
///
/// let sealed = gate.encrypt("s3cr3t").unwrap();
/// assert_ne!(sealed, "s3cr3t");
/// assert_eq!(gate.decrypt(&sealed).unwrap(), "s3cr3t");
///
/// let locked = EncryptionGate::unprovisioned();
/// assert!(locked.decrypt(&sealed).is_err());
/// ```
pub struct EncryptionGate {
    cipher: Option<Aes256Gcm>,
}

impl EncryptionGate {
    /// Creates a gate with no key material.
    pub fn unprovisioned() -> Self {
        Self { cipher: None }
    }

    /// Creates a gate from a raw 256-bit key.
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: Some(Aes256Gcm::new(key.into())),
        }
    }

    /// Creates a gate from a base64-encoded 256-bit key.
    pub fn from_base64_key(key: &str) -> Result<Self> {
        let key_bytes = BASE64
            .decode(key.trim())
            .map_err(|e| PlatformError::InvalidKeyMaterial {
                message: format!("key is not valid base64: {}", e),
            })?;

        let key: [u8; KEY_LEN] =
            key_bytes
                .try_into()
                .map_err(|bytes: Vec<u8>| PlatformError::InvalidKeyMaterial {
                    message: format!("key must be {} bytes, got {}", KEY_LEN, bytes.len()),
                })?;

        Ok(Self::new(&key))
    }

    /// Loads the key from a file holding base64 key text.
    ///
    /// A missing file means the key was never provisioned: the gate is created
    /// without a key and a warning is logged. A file that exists but does not
    /// hold a valid key is an error.
    pub fn from_key_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                "Crypto key file {} does not exist; secret config values are unavailable",
                path.display()
            );
            return Ok(Self::unprovisioned());
        }

        let content = fs::read_to_string(path)?;
        let gate = Self::from_base64_key(&content)?;
        tracing::info!("Loaded crypto key from {}", path.display());
        Ok(gate)
    }

    /// Loads the key from `key_path` if one is configured.
    pub fn from_key_path(key_path: Option<&Path>) -> Result<Self> {
        match key_path {
            Some(path) => Self::from_key_file(path),
            None => {
                tracing::warn!("No crypto key path configured; secret config values are unavailable");
                Ok(Self::unprovisioned())
            }
        }
    }

    /// Generates a new random key, base64 encoded.
    pub fn generate_base64_key() -> String {
        BASE64.encode(Aes256Gcm::generate_key(&mut OsRng))
    }

    /// Returns `true` if key material is loaded.
    pub fn is_provisioned(&self) -> bool {
        self.cipher.is_some()
    }

    fn cipher(&self, operation: &'static str) -> Result<&Aes256Gcm> {
        self.cipher
            .as_ref()
            .ok_or(PlatformError::KeyNotProvisioned { operation })
    }

    /// Encrypts `plaintext`, returning base64 ciphertext with the nonce prepended.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = self.cipher("encrypt")?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| PlatformError::InvalidKeyMaterial {
                message: format!("encryption failed: {}", e),
            })?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(combined))
    }

    /// Decrypts ciphertext produced by [`EncryptionGate::encrypt`].
    ///
    /// # Errors
    ///
    /// * `KeyNotProvisioned` - No key is loaded
    /// * `CorruptCiphertext` - The payload is not base64 or is too short
    /// * `DecryptionFailed` - Authentication failed (wrong key or tampering)
    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let cipher = self.cipher("decrypt")?;

        let combined = BASE64
            .decode(ciphertext)
            .map_err(|e| PlatformError::CorruptCiphertext {
                message: format!("not valid base64: {}", e),
            })?;

        if combined.len() <= NONCE_LEN {
            return Err(PlatformError::CorruptCiphertext {
                message: format!("{} bytes is too short to hold a nonce and tag", combined.len()),
            });
        }

        let (nonce_bytes, sealed) = combined.split_at(NONCE_LEN);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| PlatformError::DecryptionFailed {
                message: "authentication failed (wrong key or tampered value)".to_string(),
            })?;

        String::from_utf8(plaintext).map_err(|e| PlatformError::DecryptionFailed {
            message: format!("plaintext is not UTF-8: {}", e),
        })
    }

    /// Prepares a value for storage, sealing it when `secret` is set.
    pub fn protect(&self, value: &str, secret: bool) -> Result<StoredValue> {
        let value = if secret {
            self.encrypt(value)?
        } else {
            value.to_string()
        };
        Ok(StoredValue { value, secret })
    }

    /// Returns the plaintext of a stored value, opening it when it is secret.
    pub fn reveal(&self, stored: &StoredValue) -> Result<String> {
        if stored.secret {
            self.decrypt(&stored.value)
        } else {
            Ok(stored.value.clone())
        }
    }
}

impl fmt::Debug for EncryptionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionGate")
            .field("provisioned", &self.is_provisioned())
            .finish()
    }
}
