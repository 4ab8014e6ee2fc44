//! Latsight daemon - per-region latency analytics over HTTP
//!
//! Loads the configuration and the telemetry corpus once, then serves the
//! analytics API until SIGTERM or SIGINT is received.
//!
//! # Architecture
//!
//! The corpus is validated at startup and wrapped in an `Aggregator` shared
//! by every connection task. Shutdown is propagated through a
//! `CancellationToken` that stops the accept loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use latsight_core::config::{Config, ConfigBuilder};
use latsight_core::{Aggregator, Dataset};
use latsight_server::{ApiServer, AppState};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "latsightd", version, about = "Per-region latency analytics service")]
struct Cli {
    /// Use alternate config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides server.listen_addr)
    #[arg(long)]
    listen: Option<String>,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate configuration and corpus, print the known regions, then exit
    #[arg(long)]
    check: bool,
}

impl Cli {
    /// Load the config file and apply command-line overrides.
    ///
    /// The second value is the parse error of a default config file that
    /// exists but was ignored; it is logged once tracing is up.
    fn resolve_config(&self) -> Result<(Config, Option<anyhow::Error>)> {
        let (config, ignored) = match &self.config {
            Some(path) => {
                let config = Config::load(path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?;
                (config, None)
            }
            None => load_default_config(&Config::default_path()),
        };

        let mut builder = ConfigBuilder::from_config(config);
        if let Some(listen) = &self.listen {
            builder = builder.listen_addr(listen.clone());
        }
        match self.verbose {
            0 => {}
            1 => builder = builder.logging_level("debug"),
            _ => builder = builder.logging_level("trace"),
        }

        let config = builder.build_validated().map_err(|errors| {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            anyhow::anyhow!("Invalid configuration: {joined}")
        })?;
        Ok((config, ignored))
    }
}

/// Load the default config file. A missing file silently yields defaults;
/// a file that exists but cannot be read or parsed also yields defaults,
/// and its error is returned alongside.
fn load_default_config(path: &Path) -> (Config, Option<anyhow::Error>) {
    if !path.exists() {
        return (Config::default(), None);
    }
    match Config::load(path) {
        Ok(config) => (config, None),
        Err(e) => {
            let e = e.context(format!("Failed to load config from {}", path.display()));
            (Config::default(), Some(e))
        }
    }
}

fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

fn load_dataset(config: &Config) -> Result<Dataset> {
    match &config.dataset.path {
        Some(path) => {
            info!(path = %path.display(), "Loading telemetry corpus from file");
            Dataset::from_path(path)
                .with_context(|| format!("Failed to load corpus from {}", path.display()))
        }
        None => Dataset::embedded().context("Embedded telemetry corpus is invalid"),
    }
}

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, ignored_config) = cli.resolve_config()?;

    init_tracing(&config);
    info!("Latsight daemon starting (latsightd)");
    if let Some(e) = ignored_config {
        warn!(error = %format!("{e:#}"), "Ignoring invalid default config file, using defaults");
    }

    let dataset = match load_dataset(&config) {
        Ok(dataset) => dataset,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Cannot start without a valid corpus");
            return Err(e);
        }
    };
    let regions = dataset.regions();
    info!(
        records = dataset.len(),
        regions = %regions.join(","),
        "Telemetry corpus loaded"
    );

    if cli.check {
        println!("configuration OK");
        println!("records: {}", dataset.len());
        println!("regions: {}", regions.join(", "));
        return Ok(());
    }

    let aggregator = Arc::new(Aggregator::new(dataset));
    let state = Arc::new(AppState::from_config(&config, aggregator)?);
    let server = ApiServer::new(state, &config.server.listen_addr)?;

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let result = server.run(shutdown_token).await;

    match &result {
        Ok(()) => info!("Latsight daemon shut down gracefully"),
        Err(e) => error!(error = %e, "Latsight daemon exiting with error"),
    }

    result
}
