// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declares the platform's message exchanges before any service starts.
//!
//! ## Usage
//!
//! ```bash
//! # Use settings from the environment and the default settings file
//! packcfg-bootstrap
//!
//! # Point at a specific broker and settings file
//! packcfg-bootstrap --config /etc/packcfg/config.yaml --broker-host rabbit
//! ```
//!
//! Exits 0 once every exchange is declared and 1 on any fatal error.

use clap::Parser;
use packcfg::adapters::{AmqpConnector, OverrideSource};
use packcfg::domain::{platform_exchanges, Result};
use packcfg::service::{is_misconfiguration, Settings, TopologyBootstrap};
use std::path::PathBuf;
use std::process::ExitCode;

/// Declare the platform message exchanges
#[derive(Parser, Debug)]
#[command(name = "packcfg-bootstrap")]
#[command(version)]
#[command(about = "Declare the platform message exchanges")]
struct Cli {
    /// Settings file (default: the per-user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Broker host
    #[arg(long)]
    broker_host: Option<String>,

    /// Broker port
    #[arg(long)]
    broker_port: Option<u16>,

    /// Broker user
    #[arg(long)]
    broker_user: Option<String>,

    /// Broker password (prefer PACKCFG_BROKER__PASSWORD)
    #[arg(long)]
    broker_password: Option<String>,

    /// Broker virtual host
    #[arg(long)]
    vhost: Option<String>,

    /// Connection attempts before giving up
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn overrides(&self) -> OverrideSource {
        OverrideSource::new()
            .set_opt("broker.host", self.broker_host.as_ref())
            .set_opt("broker.port", self.broker_port)
            .set_opt("broker.username", self.broker_user.as_ref())
            .set_opt("broker.password", self.broker_password.as_ref())
            .set_opt("broker.vhost", self.vhost.as_ref())
            .set_opt("retry.max_attempts", self.max_attempts)
    }
}

fn setup_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let builder = Settings::builder().with_env();
    let builder = match &cli.config {
        Some(path) => builder.with_yaml_file(path)?,
        None => builder.with_default_yaml()?,
    };
    builder.with_overrides(cli.overrides()).build()
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;

    // Surfaces a malformed key file now rather than on the first secret read.
    let gate = settings.encryption_gate()?;
    tracing::debug!("Encryption gate: {:?}", gate);

    tracing::info!("Bootstrapping topology on {}", settings.broker);
    let bootstrap = TopologyBootstrap::new(
        AmqpConnector::new(settings.broker.clone()),
        settings.retry.clone(),
    );
    let report = bootstrap.register_exchanges(platform_exchanges()).await?;

    tracing::info!(
        "Topology ready: {} exchanges declared in {} attempt(s)",
        report.declared.len(),
        report.attempts
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if is_misconfiguration(&e) {
                tracing::error!("Bootstrap aborted, check broker configuration: {}", e);
            } else {
                tracing::error!("Bootstrap failed: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
