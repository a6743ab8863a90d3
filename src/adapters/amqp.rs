// SPDX-License-Identifier: MIT OR Apache-2.0

//! AMQP 0.9.1 broker adapter.
//!
//! Connects to RabbitMQ (or any AMQP 0.9.1 broker) with `lapin` and declares
//! exchanges on a dedicated channel.

use crate::domain::{BrokerConfig, ExchangeKind, ExchangeSpec, PlatformError, Result};
use crate::ports::{BrokerConnector, BrokerSession};
use async_trait::async_trait;
use lapin::options::ExchangeDeclareOptions;
use lapin::protocol::{AMQPError, AMQPErrorKind, AMQPHardError, AMQPSoftError};
use lapin::types::FieldTable;
use lapin::uri::{AMQPAuthority, AMQPScheme, AMQPUri, AMQPUserInfo};
use lapin::{Channel, Connection, ConnectionProperties};

/// Broker connector backed by `lapin`.
///
/// # Examples
///
/// ```rust,no_run
/// use packcfg::adapters::AmqpConnector;
/// use packcfg::domain::BrokerConfig;
/// use packcfg::ports::BrokerConnector;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = AmqpConnector::new(BrokerConfig::default());
/// let session = connector.connect().await?;
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AmqpConnector {
    config: BrokerConfig,
}

/// Connection name shown in the broker's management UI.
const CONNECTION_NAME: &str = "packcfg-bootstrap";

impl AmqpConnector {
    /// Creates a connector for `config`.
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    fn uri(&self) -> AMQPUri {
        AMQPUri {
            scheme: AMQPScheme::AMQP,
            authority: AMQPAuthority {
                userinfo: AMQPUserInfo {
                    username: self.config.username.clone(),
                    password: self.config.password.clone(),
                },
                host: self.config.host.clone(),
                port: self.config.port,
            },
            vhost: self.config.vhost.clone(),
            query: Default::default(),
        }
    }
}

#[async_trait]
impl BrokerConnector for AmqpConnector {
    async fn connect(&self) -> Result<Box<dyn BrokerSession>> {
        tracing::debug!("Connecting to {}", self.config);

        let properties = ConnectionProperties::default()
            .with_connection_name(CONNECTION_NAME.into());

        let connection = Connection::connect_uri(self.uri(), properties)
            .await
            .map_err(|e| classify(e, None, "connection failed"))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| classify(e, None, "channel creation failed"))?;

        Ok(Box::new(AmqpSession {
            connection,
            channel,
        }))
    }
}

/// An open connection with one channel used for declarations.
struct AmqpSession {
    connection: Connection,
    channel: Channel,
}

#[async_trait]
impl BrokerSession for AmqpSession {
    async fn declare_exchange(&mut self, spec: &ExchangeSpec) -> Result<()> {
        self.channel
            .exchange_declare(
                &spec.name,
                exchange_kind(spec.kind),
                ExchangeDeclareOptions {
                    durable: spec.durable,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| classify(e, Some(spec), "exchange declaration failed"))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        // Channel may already be closed by the broker; only the connection close matters
        let _ = self.channel.close(200, "bootstrap complete").await;
        self.connection
            .close(200, "bootstrap complete")
            .await
            .map_err(|e| classify(e, None, "connection close failed"))
    }
}

fn exchange_kind(kind: ExchangeKind) -> lapin::ExchangeKind {
    match kind {
        ExchangeKind::Direct => lapin::ExchangeKind::Direct,
        ExchangeKind::Topic => lapin::ExchangeKind::Topic,
        ExchangeKind::Fanout => lapin::ExchangeKind::Fanout,
    }
}

/// How a broker failure should be treated by the bootstrap.
enum Failure {
    Unavailable,
    Mismatch,
    Rejected,
}

/// Sorts a lapin error into transient unavailability, topology drift, or refusal.
fn classify(e: lapin::Error, spec: Option<&ExchangeSpec>, context: &str) -> PlatformError {
    let failure = match &e {
        lapin::Error::ProtocolError(amqp) => match amqp.kind() {
            AMQPErrorKind::Soft(AMQPSoftError::PRECONDITIONFAILED) => Failure::Mismatch,
            AMQPErrorKind::Hard(AMQPHardError::CONNECTIONFORCED) => Failure::Unavailable,
            _ => Failure::Rejected,
        },
        _ => Failure::Unavailable,
    };
    let message = format!("{}: {}", context, e);

    match failure {
        Failure::Mismatch => PlatformError::TopologyMismatch {
            exchange: spec.map(|s| s.name.clone()).unwrap_or_default(),
            message: format!(
                "broker refused redeclaration as {}: {}",
                spec.map(ToString::to_string).unwrap_or_default(),
                e
            ),
        },
        Failure::Unavailable => PlatformError::BrokerUnavailable {
            message,
            source: Some(Box::new(e)),
        },
        Failure::Rejected => PlatformError::BrokerRejected {
            message,
            source: Some(Box::new(e)),
        },
    }
}
