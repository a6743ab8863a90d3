// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer.
//!
//! The encryption gate, the config store and controller built on it, the retry
//! policy, the topology bootstrap and layered settings.

pub mod config_store;
pub mod controller;
pub mod encryption;
pub mod retry;
pub mod settings;
pub mod topology;

// Re-export commonly used types
pub use config_store::ConfigStore;
pub use controller::{status_for, ApiError, ApiResponse, ApiResult, PackConfigController};
pub use encryption::EncryptionGate;
pub use retry::{attempt, RetryError, RetryPolicy, Retryable};
pub use settings::{CryptoSettings, DatastoreSettings, Settings, SettingsBuilder};
#[cfg(feature = "amqp")]
pub use topology::register_exchanges;
pub use topology::{is_misconfiguration, BootstrapReport, TopologyBootstrap};
