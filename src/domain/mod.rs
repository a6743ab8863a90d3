// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types.
//!
//! Packs, config items, exchange specs, broker parameters and the error type.
//! Nothing here talks to a store, a broker or the environment.

pub mod broker_config;
pub mod config_item;
pub mod errors;
pub mod exchange;
pub mod pack;

// Re-export commonly used types
pub use broker_config::BrokerConfig;
pub use config_item::{ConfigItem, ItemKey, StoredValue};
pub use errors::{PlatformError, Result};
pub use exchange::{platform_exchanges, ExchangeKind, ExchangeSpec};
pub use pack::Pack;
