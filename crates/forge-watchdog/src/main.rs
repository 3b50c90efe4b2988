//! # Forge Watchdog
//!
//! Supervises a forging node until a fatal error or Ctrl+C.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments, initialize logging
//! 2. Load configuration (file, then `WATCHDOG_*` environment overrides)
//! 3. Verify the node is running, record the missed-block baseline
//! 4. Reconcile every `CheckIntervalSecs`
//!
//! Any fatal error is logged and the process exits with status 1.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use forge_watchdog::{Watchdog, WatchdogConfig, DEFAULT_CONFIG_PATH};

/// Forge Watchdog: keeps a forging node updated, synced and forging
#[derive(Parser, Debug)]
#[command(name = "forge-watchdog")]
#[command(about = "Auto-update, reload on drift, and keep forging enabled")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log filter (overrides RUST_LOG), e.g. "info" or "forge_watchdog=debug"
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(args: &Args) -> Result<()> {
    let filter = match &args.log_level {
        Some(level) => EnvFilter::try_new(level).context("Invalid log filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let result = if args.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

async fn run(args: &Args) -> Result<()> {
    let config = WatchdogConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let watchdog = Watchdog::from_config(config)?;

    tokio::select! {
        result = watchdog.run() => result.context("Watchdog stopped"),
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("[watchdog] Shutdown signal received");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = init_logging(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&args).await {
        error!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}
