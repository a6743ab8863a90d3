// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message broker trait definitions.
//!
//! The topology bootstrap only needs two things from a broker: a way to open a
//! session and a way to declare an exchange on it. Keeping that surface behind
//! these traits lets the retry logic run against a fake broker in tests.

use crate::domain::{ExchangeSpec, Result};
use async_trait::async_trait;

/// Opens sessions against a message broker.
///
/// # Error Contract
///
/// `connect` must report an unreachable, refusing or resetting broker as
/// `PlatformError::BrokerUnavailable`, which is the only failure the bootstrap
/// retries. Authentication failures belong in `PlatformError::BrokerRejected`.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    /// Opens a new session.
    async fn connect(&self) -> Result<Box<dyn BrokerSession>>;
}

/// An open broker session.
#[async_trait]
pub trait BrokerSession: Send {
    /// Declares `spec` on the broker.
    ///
    /// Declaring an exchange that already exists with the same kind and
    /// durability succeeds without changing anything. If it exists with other
    /// parameters the session must fail with `PlatformError::TopologyMismatch`.
    async fn declare_exchange(&mut self, spec: &ExchangeSpec) -> Result<()>;

    /// Closes the session.
    async fn close(self: Box<Self>) -> Result<()>;
}
