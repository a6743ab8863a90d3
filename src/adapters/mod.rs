// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing port implementations.
//!
//! Stores, the pack registry, the AMQP broker connector and settings sources.
//! Adapters with heavy dependencies sit behind feature flags.

#[cfg(feature = "amqp")]
pub mod amqp;
#[cfg(feature = "env")]
pub mod env_var;
pub mod memory_store;
pub mod overrides;
pub mod pack_registry;
#[cfg(feature = "redis")]
pub mod redis;
#[cfg(feature = "yaml")]
pub mod yaml_file;

// Re-export adapters based on feature flags
#[cfg(feature = "amqp")]
pub use amqp::AmqpConnector;
#[cfg(feature = "env")]
pub use env_var::EnvVarSource;
pub use memory_store::InMemoryStore;
pub use overrides::OverrideSource;
pub use pack_registry::InMemoryPackRegistry;
#[cfg(feature = "redis")]
pub use redis::RedisStore;
#[cfg(feature = "yaml")]
pub use yaml_file::YamlFileSource;
