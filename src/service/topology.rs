// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot declaration of the messaging topology.

use crate::domain::exchange::dedupe_specs;
use crate::domain::{ExchangeSpec, PlatformError, Result};
use crate::ports::BrokerConnector;
use crate::service::retry::{attempt, RetryPolicy};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

const OPERATION: &str = "register exchanges";

/// Outcome of a successful bootstrap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Exchanges declared, in declaration order, after removing duplicates
    pub declared: Vec<ExchangeSpec>,
    /// Connection attempts used, or 0 if the broker was never contacted
    pub attempts: u32,
}

/// Declares a fixed set of exchanges before anything publishes to them.
///
/// Each attempt opens a fresh session and declares the whole set, so an attempt
/// cut short by a dropped connection is simply redone. Declaration is
/// idempotent on the broker side, which makes redoing it safe.
///
/// The only state kept is whether a bootstrap has completed.
///
/// # Examples
///
/// ```rust,ignore
/// use packcfg::adapters::AmqpConnector;
/// use packcfg::domain::{platform_exchanges, BrokerConfig};
/// use packcfg::service::{RetryPolicy, TopologyBootstrap};
///
/// # async fn run() -> packcfg::domain::Result<()> {
/// let bootstrap = TopologyBootstrap::new(
///     AmqpConnector::new(BrokerConfig::default()),
///     RetryPolicy::default(),
/// );
/// let report = bootstrap.register_exchanges(platform_exchanges()).await?;
/// println!("declared {} exchanges", report.declared.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TopologyBootstrap<C> {
    connector: C,
    policy: RetryPolicy,
    completed: AtomicBool,
}

impl<C: BrokerConnector> TopologyBootstrap<C> {
    /// Creates a bootstrap opening sessions through `connector`.
    pub fn new(connector: C, policy: RetryPolicy) -> Self {
        Self {
            connector,
            policy,
            completed: AtomicBool::new(false),
        }
    }

    /// Returns `true` once a call to [`TopologyBootstrap::register_exchanges`]
    /// has succeeded.
    pub fn is_complete(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Returns the connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Declares every exchange in `specs`.
    ///
    /// Identical specs are declared once. An empty set succeeds without
    /// contacting the broker.
    ///
    /// # Errors
    ///
    /// * `TopologyMismatch` - Two specs share a name but disagree, or the broker
    ///   holds an exchange with other parameters. Never retried.
    /// * `BrokerRejected` - The broker refused the session. Never retried.
    /// * `RetriesExhausted` - The broker stayed unavailable for every attempt.
    pub async fn register_exchanges(&self, specs: &[ExchangeSpec]) -> Result<BootstrapReport> {
        let unique = dedupe_specs(specs)?;

        if unique.is_empty() {
            tracing::info!("No exchanges to declare; skipping broker connection");
            self.completed.store(true, Ordering::Release);
            return Ok(BootstrapReport {
                declared: unique,
                attempts: 0,
            });
        }

        tracing::info!("Declaring {} exchanges", unique.len());
        let used = AtomicU32::new(0);

        attempt(OPERATION, &self.policy, |n| {
            used.store(n, Ordering::Relaxed);
            self.declare_all(&unique)
        })
        .await
        .map_err(|e| e.into_platform_error(OPERATION))?;

        let attempts = used.load(Ordering::Relaxed);
        self.completed.store(true, Ordering::Release);
        tracing::info!(
            "Declared {} exchanges after {} attempt(s)",
            unique.len(),
            attempts
        );

        Ok(BootstrapReport {
            declared: unique,
            attempts,
        })
    }

    async fn declare_all(&self, specs: &[ExchangeSpec]) -> Result<()> {
        let mut session = self.connector.connect().await?;

        for spec in specs {
            if let Err(e) = session.declare_exchange(spec).await {
                if let Err(close_error) = session.close().await {
                    tracing::debug!("Ignoring close failure after declare error: {}", close_error);
                }
                return Err(e);
            }
            tracing::debug!("Declared exchange {}", spec);
        }

        session.close().await
    }
}

/// Declares `specs` on the AMQP broker described by `config`.
///
/// Convenience for processes that bootstrap once and never inspect the
/// bootstrap afterwards.
#[cfg(feature = "amqp")]
pub async fn register_exchanges(
    specs: &[ExchangeSpec],
    config: &crate::domain::BrokerConfig,
    policy: RetryPolicy,
) -> Result<BootstrapReport> {
    let connector = crate::adapters::AmqpConnector::new(config.clone());
    TopologyBootstrap::new(connector, policy)
        .register_exchanges(specs)
        .await
}

/// Returns `true` if a bootstrap error points at configuration (topology or
/// credentials) rather than at an unreachable broker.
pub fn is_misconfiguration(error: &PlatformError) -> bool {
    matches!(
        error,
        PlatformError::TopologyMismatch { .. } | PlatformError::BrokerRejected { .. }
    )
}
