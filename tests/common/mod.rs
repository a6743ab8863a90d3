// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for integration tests: Docker detection and an in-process
//! fake message broker.

#![allow(dead_code)]

use async_trait::async_trait;
use packcfg::domain::{ExchangeSpec, PlatformError, Result};
use packcfg::ports::{BrokerConnector, BrokerSession};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Cached result of Docker availability check.
static DOCKER_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Checks if Docker is available on the system.
///
/// This check is cached after the first call.
pub fn is_docker_available() -> bool {
    *DOCKER_AVAILABLE.get_or_init(|| {
        std::process::Command::new("docker")
            .args(["ps"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    })
}

/// Prints a warning message that a test is skipped due to Docker being unavailable.
pub fn print_docker_unavailable_warning(test_name: &str) {
    eprintln!("\n⚠️  SKIPPED: {} - Docker is not available", test_name);
    eprintln!("   To run this test, ensure Docker is installed and running.");
    eprintln!("   Installation: https://docs.docker.com/get-docker/\n");
}

#[derive(Debug, Default)]
struct BrokerState {
    exchanges: BTreeMap<String, ExchangeSpec>,
    refuse_connections: u32,
    reject_login: bool,
    drop_after_declares: Option<u32>,
    connects: u32,
    declare_calls: u32,
}

/// An in-process broker that remembers declared exchanges.
///
/// Clones share state, so a test can hand one clone to the bootstrap and
/// inspect the other.
#[derive(Clone, Debug, Default)]
pub struct FakeBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses the first `n` connection attempts.
    pub fn refusing_first(self, n: u32) -> Self {
        self.state.lock().unwrap().refuse_connections = n;
        self
    }

    /// Rejects every login as bad credentials.
    pub fn rejecting_login(self) -> Self {
        self.state.lock().unwrap().reject_login = true;
        self
    }

    /// Drops the first session after it has declared `n` exchanges.
    pub fn dropping_after(self, n: u32) -> Self {
        self.state.lock().unwrap().drop_after_declares = Some(n);
        self
    }

    /// Pre-creates an exchange on the broker.
    pub fn with_exchange(self, spec: ExchangeSpec) -> Self {
        self.state
            .lock()
            .unwrap()
            .exchanges
            .insert(spec.name.clone(), spec);
        self
    }

    pub fn exchanges(&self) -> Vec<ExchangeSpec> {
        self.state.lock().unwrap().exchanges.values().cloned().collect()
    }

    pub fn exchange_names(&self) -> Vec<String> {
        self.state.lock().unwrap().exchanges.keys().cloned().collect()
    }

    pub fn connects(&self) -> u32 {
        self.state.lock().unwrap().connects
    }

    pub fn declare_calls(&self) -> u32 {
        self.state.lock().unwrap().declare_calls
    }
}

#[async_trait]
impl BrokerConnector for FakeBroker {
    async fn connect(&self) -> Result<Box<dyn BrokerSession>> {
        let mut state = self.state.lock().unwrap();
        state.connects += 1;

        if state.refuse_connections > 0 {
            state.refuse_connections -= 1;
            return Err(PlatformError::broker_unavailable("connection refused"));
        }
        if state.reject_login {
            return Err(PlatformError::BrokerRejected {
                message: "ACCESS_REFUSED - Login was refused".to_string(),
                source: None,
            });
        }

        let drop_after = state.drop_after_declares.take();
        Ok(Box::new(FakeSession {
            state: self.state.clone(),
            drop_after,
            declared: 0,
        }))
    }
}

struct FakeSession {
    state: Arc<Mutex<BrokerState>>,
    drop_after: Option<u32>,
    declared: u32,
}

#[async_trait]
impl BrokerSession for FakeSession {
    async fn declare_exchange(&mut self, spec: &ExchangeSpec) -> Result<()> {
        if self.drop_after == Some(self.declared) {
            return Err(PlatformError::broker_unavailable("connection reset by peer"));
        }

        let mut state = self.state.lock().unwrap();
        state.declare_calls += 1;

        match state.exchanges.get(&spec.name) {
            Some(existing) if existing != spec => {
                return Err(PlatformError::TopologyMismatch {
                    exchange: spec.name.clone(),
                    message: format!("exists as {}", existing),
                });
            }
            Some(_) => {}
            None => {
                state.exchanges.insert(spec.name.clone(), spec.clone());
            }
        }

        self.declared += 1;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
