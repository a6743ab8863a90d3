// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! These traits are the seams between the core and the outside world: the
//! datastore, the pack registry, the message broker and settings sources.
//! Adapters in the adapters layer implement them.

pub mod broker;
pub mod pack_lookup;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use broker::{BrokerConnector, BrokerSession};
pub use pack_lookup::PackLookup;
pub use source::SettingSource;
pub use store::Store;
