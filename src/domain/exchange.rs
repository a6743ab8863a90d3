// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative messaging topology.

use crate::domain::errors::{PlatformError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Routing behaviour of an exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    /// Route on exact routing key match.
    Direct,
    /// Route on routing key pattern match.
    Topic,
    /// Route to every bound queue.
    Fanout,
}

impl ExchangeKind {
    /// Returns the broker's name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeKind::Direct => "direct",
            ExchangeKind::Topic => "topic",
            ExchangeKind::Fanout => "fanout",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declarative description of one exchange.
///
/// # Examples
///
/// ```
/// use packcfg::domain::{ExchangeKind, ExchangeSpec};
///
/// let spec = ExchangeSpec::topic("execution");
/// assert_eq!(spec.kind, ExchangeKind::Topic);
/// assert!(spec.durable);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExchangeSpec {
    /// Exchange name
    pub name: String,
    /// Routing behaviour
    pub kind: ExchangeKind,
    /// Whether the exchange survives a broker restart
    pub durable: bool,
}

impl ExchangeSpec {
    /// Creates an exchange spec.
    pub fn new(name: impl Into<String>, kind: ExchangeKind, durable: bool) -> Self {
        ExchangeSpec {
            name: name.into(),
            kind,
            durable,
        }
    }

    /// Creates a durable topic exchange spec.
    pub fn topic(name: impl Into<String>) -> Self {
        Self::new(name, ExchangeKind::Topic, true)
    }
}

impl fmt::Display for ExchangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.name,
            self.kind,
            if self.durable { "durable" } else { "transient" }
        )
    }
}

static PLATFORM_EXCHANGES: Lazy<Vec<ExchangeSpec>> = Lazy::new(|| {
    [
        "actionexecution.state",
        "announcement",
        "execution",
        "liveaction",
        "liveaction.status",
        "trigger",
        "trigger.dispatch",
        "sensor",
        "workflow",
        "workflow.status",
    ]
    .into_iter()
    .map(ExchangeSpec::topic)
    .collect()
});

/// The exchanges every platform component expects to exist.
pub fn platform_exchanges() -> &'static [ExchangeSpec] {
    &PLATFORM_EXCHANGES
}

/// Collapses duplicate specs, keeping first-seen order.
///
/// Identical specs declare once. Two specs sharing a name but disagreeing on
/// kind or durability can never both hold on the broker, so they are reported
/// as a mismatch before any connection is made.
pub fn dedupe_specs(specs: &[ExchangeSpec]) -> Result<Vec<ExchangeSpec>> {
    let mut unique: Vec<ExchangeSpec> = Vec::with_capacity(specs.len());

    for spec in specs {
        match unique.iter().find(|seen| seen.name == spec.name) {
            Some(seen) if seen == spec => continue,
            Some(seen) => {
                return Err(PlatformError::TopologyMismatch {
                    exchange: spec.name.clone(),
                    message: format!("declared as both {} and {}", seen, spec),
                })
            }
            None => unique.push(spec.clone()),
        }
    }

    Ok(unique)
}
