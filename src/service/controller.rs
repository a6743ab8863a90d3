// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request-facing CRUD over pack config items.
//!
//! [`PackConfigController`] backs four routes:
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | GET | `/packs/config/{pack_ref_or_id}` | [`PackConfigController::get_all`] |
//! | GET | `/packs/config/{pack_ref_or_id}/{name}` | [`PackConfigController::get_one`] |
//! | PUT | `/packs/config/{pack_ref_or_id}/{name}` | [`PackConfigController::put`] |
//! | DELETE | `/packs/config/{pack_ref_or_id}/{name}` | [`PackConfigController::delete`] |
//!
//! Routing and transport are left to the caller. Each operation hands back the
//! status code to send along with a serializable body.

use crate::domain::{ConfigItem, ItemKey, Pack, PlatformError, Result};
use crate::ports::PackLookup;
use crate::service::ConfigStore;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A successful reply: the status to send and the body, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse<T> {
    /// HTTP status
    pub status: StatusCode,
    /// Response body; `None` for `204 No Content`
    pub body: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok(body: T) -> Self {
        Self {
            status: StatusCode::OK,
            body: Some(body),
        }
    }
}

impl ApiResponse<()> {
    fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: None,
        }
    }
}

/// A failed reply.
///
/// Serializes to `{"faultstring": "...", "code": "..."}`; the status is carried
/// beside the body, not in it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApiError {
    /// HTTP status
    #[serde(skip)]
    pub status: StatusCode,
    /// Human readable description of the failure
    pub faultstring: String,
    /// Stable name of the failure kind, such as `"PackNotFound"`
    pub code: &'static str,
}

impl From<PlatformError> for ApiError {
    fn from(error: PlatformError) -> Self {
        let status = status_for(&error);
        if status.is_server_error() {
            tracing::error!("Pack config request failed: {}", error);
        } else {
            tracing::debug!("Pack config request rejected ({}): {}", status, error);
        }
        ApiError {
            status,
            faultstring: error.to_string(),
            code: error_code(&error),
        }
    }
}

/// Result of a controller operation.
pub type ApiResult<T> = std::result::Result<ApiResponse<T>, ApiError>;

/// Maps an error onto the status code a client should see.
pub fn status_for(error: &PlatformError) -> StatusCode {
    match error {
        PlatformError::PackNotFound { .. } | PlatformError::KeyNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        PlatformError::KeyNotProvisioned { .. } => StatusCode::CONFLICT,
        PlatformError::InvalidRequestBody { .. } | PlatformError::InvalidKey { .. } => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_code(error: &PlatformError) -> &'static str {
    match error {
        PlatformError::PackNotFound { .. } => "PackNotFound",
        PlatformError::KeyNotFound { .. } => "KeyNotFound",
        PlatformError::KeyNotProvisioned { .. } => "KeyNotProvisioned",
        PlatformError::DecryptionFailed { .. } => "DecryptionFailed",
        PlatformError::CorruptCiphertext { .. } => "CorruptCiphertext",
        PlatformError::InvalidKeyMaterial { .. } => "InvalidKeyMaterial",
        PlatformError::InvalidRequestBody { .. } => "InvalidRequestBody",
        PlatformError::InvalidKey { .. } => "InvalidKey",
        PlatformError::InvalidPack { .. } => "InvalidPack",
        PlatformError::TopologyMismatch { .. } => "TopologyMismatch",
        PlatformError::BrokerUnavailable { .. } => "BrokerUnavailable",
        PlatformError::BrokerRejected { .. } => "BrokerRejected",
        PlatformError::RetriesExhausted { .. } => "RetriesExhausted",
        PlatformError::StoreError { .. } => "StoreError",
        PlatformError::InvalidSetting { .. } => "InvalidSetting",
        PlatformError::ParseError { .. } => "ParseError",
        PlatformError::IoError(_) => "IoError",
    }
}

/// Body of a PUT request.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PutBody {
    value: String,
    #[serde(default)]
    secret: bool,
    #[serde(default)]
    name: Option<String>,
}

/// Serves pack config requests.
///
/// Every operation resolves the pack first; nothing touches the store for a
/// pack that does not exist. Items are keyed by the pack's canonical ref, so a
/// pack addressed by id and by ref sees the same items.
///
/// # Examples
///
/// ```rust
/// use http::StatusCode;
/// use packcfg::adapters::{InMemoryPackRegistry, InMemoryStore};
/// use packcfg::domain::Pack;
/// use packcfg::service::{ConfigStore, EncryptionGate, PackConfigController};
/// use std::sync::Arc;
///
/// # fn main() -> packcfg::domain::Result<()> {
/// let packs = InMemoryPackRegistry::with_packs([Pack::new("42", "aws")?])?;
/// let store = ConfigStore::new(
///     Arc::new(InMemoryStore::new()),
///     Arc::new(EncryptionGate::unprovisioned()),
/// );
/// let controller = PackConfigController::new(Arc::new(packs), store);
///
/// let reply = controller.put("42", "region", br#"{"value": "us-east-1"}"#).unwrap();
/// assert_eq!(reply.status, StatusCode::OK);
///
/// let items = controller.get_all("aws").unwrap().body.unwrap();
/// assert_eq!(items[0].value, "us-east-1");
///
/// let missing = controller.get_all("gcp").unwrap_err();
/// assert_eq!(missing.status, StatusCode::NOT_FOUND);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PackConfigController {
    packs: Arc<dyn PackLookup>,
    store: ConfigStore,
}

impl PackConfigController {
    /// Creates a controller resolving packs through `packs`.
    pub fn new(packs: Arc<dyn PackLookup>, store: ConfigStore) -> Self {
        Self { packs, store }
    }

    /// `GET /packs/config/{pack_ref_or_id}`: every item of the pack.
    pub fn get_all(&self, pack_ref_or_id: &str) -> ApiResult<Vec<ConfigItem>> {
        let pack = self.resolve(pack_ref_or_id)?;
        let items = self.store.list_for_pack(pack.pack_ref())?;
        Ok(ApiResponse::ok(items))
    }

    /// `GET /packs/config/{pack_ref_or_id}/{name}`: one item.
    pub fn get_one(&self, pack_ref_or_id: &str, name: &str) -> ApiResult<ConfigItem> {
        let key = self.item_key(pack_ref_or_id, name)?;
        let item = self.store.require(&key)?;
        Ok(ApiResponse::ok(item))
    }

    /// `PUT /packs/config/{pack_ref_or_id}/{name}`: creates or replaces an item.
    ///
    /// `body` is JSON: `{"value": "...", "secret": false, "name": "..."}`, where
    /// `secret` and `name` are optional. A `name` that disagrees with the path
    /// is rejected.
    pub fn put(&self, pack_ref_or_id: &str, name: &str, body: &[u8]) -> ApiResult<ConfigItem> {
        let key = self.item_key(pack_ref_or_id, name)?;
        let body = parse_put_body(body)?;

        if let Some(body_name) = body.name.as_deref() {
            if body_name != name {
                return Err(PlatformError::invalid_body(format!(
                    "body name \"{}\" does not match path name \"{}\"",
                    body_name, name
                ))
                .into());
            }
        }

        let item = self.store.put(&key, &body.value, body.secret)?;
        tracing::info!("Set config item '{}' (secret={})", key, body.secret);
        Ok(ApiResponse::ok(item))
    }

    /// `DELETE /packs/config/{pack_ref_or_id}/{name}`: removes an item.
    pub fn delete(&self, pack_ref_or_id: &str, name: &str) -> ApiResult<()> {
        let key = self.item_key(pack_ref_or_id, name)?;
        self.store.delete(&key)?;
        tracing::info!("Deleted config item '{}'", key);
        Ok(ApiResponse::no_content())
    }

    fn resolve(&self, pack_ref_or_id: &str) -> Result<Pack> {
        self.packs
            .find_by_ref_or_id(pack_ref_or_id)?
            .ok_or_else(|| PlatformError::PackNotFound {
                pack_ref_or_id: pack_ref_or_id.to_string(),
            })
    }

    fn item_key(&self, pack_ref_or_id: &str, name: &str) -> Result<ItemKey> {
        let pack = self.resolve(pack_ref_or_id)?;
        ItemKey::new(pack.pack_ref(), name)
    }
}

fn parse_put_body(body: &[u8]) -> Result<PutBody> {
    serde_json::from_slice(body).map_err(|e| PlatformError::InvalidRequestBody {
        message: e.to_string(),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryPackRegistry, InMemoryStore};
    use crate::service::EncryptionGate;

    fn controller(gate: EncryptionGate) -> PackConfigController {
        let packs =
            InMemoryPackRegistry::with_packs([Pack::new("42", "aws").unwrap()]).unwrap();
        let store = ConfigStore::new(Arc::new(InMemoryStore::new()), Arc::new(gate));
        PackConfigController::new(Arc::new(packs), store)
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                PlatformError::PackNotFound {
                    pack_ref_or_id: "x".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                PlatformError::KeyNotFound {
                    pack: "aws".into(),
                    name: "x".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                PlatformError::KeyNotProvisioned {
                    operation: "decrypt",
                },
                StatusCode::CONFLICT,
            ),
            (PlatformError::invalid_body("bad"), StatusCode::BAD_REQUEST),
            (
                PlatformError::InvalidKey {
                    key: "".into(),
                    reason: "empty".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                PlatformError::store("memory", "down"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                PlatformError::DecryptionFailed {
                    message: "tag".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(status_for(&error), status, "{}", error);
        }
    }

    #[test]
    fn test_api_error_body() {
        let error = ApiError::from(PlatformError::PackNotFound {
            pack_ref_or_id: "linux".into(),
        });
        let body = serde_json::to_value(&error).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "faultstring": "Pack with ref_or_id \"linux\" does not exist",
                "code": "PackNotFound",
            })
        );
    }

    #[test]
    fn test_put_body_defaults() {
        let body = parse_put_body(br#"{"value": "x"}"#).unwrap();
        assert_eq!(body.value, "x");
        assert!(!body.secret);
        assert!(body.name.is_none());
    }

    #[test]
    fn test_put_body_rejects_unknown_fields() {
        let result = parse_put_body(br#"{"value": "x", "scope": "user"}"#);
        assert!(matches!(result, Err(PlatformError::InvalidRequestBody { .. })));
    }

    #[test]
    fn test_put_body_rejects_non_string_value() {
        assert!(parse_put_body(br#"{"value": 5}"#).is_err());
        assert!(parse_put_body(b"not json").is_err());
    }

    #[test]
    fn test_put_name_mismatch() {
        let controller = controller(EncryptionGate::unprovisioned());
        let error = controller
            .put("aws", "region", br#"{"value": "x", "name": "zone"}"#)
            .unwrap_err();
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, "InvalidRequestBody");
    }

    #[test]
    fn test_delete_returns_no_content() {
        let controller = controller(EncryptionGate::unprovisioned());
        controller
            .put("aws", "region", br#"{"value": "us-east-1"}"#)
            .unwrap();
        let reply = controller.delete("aws", "region").unwrap();
        assert_eq!(reply.status, StatusCode::NO_CONTENT);
        assert!(reply.body.is_none());
    }

    #[test]
    fn test_invalid_name_is_bad_request() {
        let controller = controller(EncryptionGate::unprovisioned());
        let error = controller.get_one("aws", "").unwrap_err();
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, "InvalidKey");
    }
}
