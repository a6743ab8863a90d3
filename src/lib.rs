// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pack configuration storage and messaging topology bootstrap.
//!
//! This crate provides two independent pieces of an automation platform's
//! control plane:
//!
//! - **Pack config**: per-pack key/value settings stored through a pluggable
//!   [`Store`](ports::Store), with secret values sealed by AES-256-GCM before
//!   they reach the store, and a request-facing controller mapping outcomes to
//!   HTTP status codes.
//! - **Topology bootstrap**: a one-shot, idempotent declaration of the
//!   platform's message exchanges, retried with exponential backoff while the
//!   broker is unreachable.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types (`Pack`, `ItemKey`, `ExchangeSpec`, `BrokerConfig`, errors)
//! - **Ports**: Trait definitions (`Store`, `PackLookup`, `BrokerConnector`, `SettingSource`)
//! - **Adapters**: Implementations (in-memory and Redis stores, AMQP connector, settings sources)
//! - **Service**: Encryption, config storage, the controller, retry, bootstrap and settings
//!
//! # Feature Flags
//!
//! - `yaml`: YAML settings files (default)
//! - `env`: Environment variable settings (default)
//! - `cli`: The `packcfg-bootstrap` binary's argument parsing and logging (default)
//! - `redis`: Redis-backed config item store
//! - `amqp`: AMQP broker connector
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use packcfg::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let packs = InMemoryPackRegistry::with_packs([Pack::new("1", "aws")?])?;
//! let gate = EncryptionGate::from_base64_key(&EncryptionGate::generate_base64_key())?;
//! let store = ConfigStore::new(Arc::new(InMemoryStore::new()), Arc::new(gate));
//! let controller = PackConfigController::new(Arc::new(packs), store);
//!
//! let put = controller.put("aws", "api_key", br#"{"value": "hunter2", "secret": true}"#);
//! assert!(put.is_ok());
//!
//! // The pack id addresses the same items as its ref.
//! let item = controller.get_one("1", "api_key").unwrap().body.unwrap();
//! assert_eq!(item.value, "hunter2");
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        platform_exchanges, BrokerConfig, ConfigItem, ExchangeKind, ExchangeSpec, ItemKey, Pack,
        PlatformError, Result,
    };
    pub use crate::ports::{BrokerConnector, BrokerSession, PackLookup, SettingSource, Store};
    pub use crate::service::{
        ConfigStore, EncryptionGate, PackConfigController, RetryPolicy, Settings,
        TopologyBootstrap,
    };

    pub use crate::adapters::{InMemoryPackRegistry, InMemoryStore, OverrideSource};
    // Re-export adapters based on feature flags
    #[cfg(feature = "amqp")]
    pub use crate::adapters::AmqpConnector;
    #[cfg(feature = "env")]
    pub use crate::adapters::EnvVarSource;
    #[cfg(feature = "redis")]
    pub use crate::adapters::RedisStore;
    #[cfg(feature = "yaml")]
    pub use crate::adapters::YamlFileSource;
}
