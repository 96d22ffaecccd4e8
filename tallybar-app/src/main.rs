// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Tallybar - Claude usage monitor
//!
//! Polls the Anthropic usage endpoint and renders a status line per
//! cycle. On Unix, SIGUSR1 triggers an immediate refresh.

mod config;
mod poller;
mod sink;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tallybar_fetch::{FileCredentials, UsageClient};

use crate::config::Config;
use crate::poller::Poller;
use crate::sink::TermSink;

/// Tallybar - monitor Claude subscription usage limits.
#[derive(Parser)]
#[command(name = "tallybar", version, about)]
struct Cli {
    /// Config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Poll interval in seconds, overriding the config file.
    #[arg(long, short)]
    interval: Option<u64>,

    /// Fetch once, print, and exit.
    #[arg(long)]
    once: bool,

    /// Enable debug logging.
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_from(&config_path)?;
    if let Some(interval) = cli.interval {
        config.poll_interval = interval;
    }

    // Being unable to locate any credential path at all is the one fatal
    // startup condition; a missing or unreadable file is retried per cycle.
    let credentials_path = config
        .credentials_path()
        .context("Could not determine a credentials file path; set credentials_path in the config")?;
    info!(path = %credentials_path.display(), "Using credentials file");

    let credentials = FileCredentials::new(credentials_path);
    let source = UsageClient::new();
    let sink = TermSink::new();

    let (mut poller, refresh) = Poller::new(source, credentials, sink, config.poll_interval());

    if cli.once {
        return match poller.run_cycle().await {
            Ok(()) => Ok(()),
            Err(e) => Err(anyhow::anyhow!(e)),
        };
    }

    #[cfg(unix)]
    spawn_refresh_on_sigusr1(refresh)?;
    #[cfg(not(unix))]
    drop(refresh);

    poller.run().await;
    Ok(())
}

/// Wires SIGUSR1 to manual refresh, the headless stand-in for a tray
/// "Refresh Now" item.
#[cfg(unix)]
fn spawn_refresh_on_sigusr1(refresh: poller::RefreshHandle) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut stream =
        signal(SignalKind::user_defined1()).context("Failed to install SIGUSR1 handler")?;

    tokio::spawn(async move {
        while stream.recv().await.is_some() {
            if !refresh.request() {
                tracing::debug!("Refresh already queued, dropping request");
            }
        }
    });

    Ok(())
}
