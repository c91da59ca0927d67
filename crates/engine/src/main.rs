//! Moneypot reconciliation daemon.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use moneypot_core::config::AppConfig;
use moneypot_engine::{BatchScheduler, BucketReconciler, ReconcilePort};
use moneypot_ledger::LedgerClient;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Moneypot - bucket reconciliation and achievement engine
#[derive(Parser, Debug)]
#[command(name = "moneypotd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "MONEYPOT_CONFIG",
        default_value = "config/moneypot.toml"
    )]
    config: String,

    /// Run a single sweep and exit instead of looping on the interval
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Moneypot v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("MONEYPOT_") && key != "MONEYPOT_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: moneypotd --config /path/to/moneypot.toml\n  \
             2. Environment variables: MONEYPOT_LEDGER__BASE_URL=https://ledger.example.com \
             MONEYPOT_LEDGER__API_KEY=YOUR_KEY moneypotd\n\n\
             Set MONEYPOT_CONFIG to specify a default config file path."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("MONEYPOT_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    for warning in config
        .ledger
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid ledger configuration: {e}"))?
    {
        tracing::warn!("{warning}");
    }
    for warning in config
        .sync
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid sync configuration: {e}"))?
    {
        tracing::warn!("{warning}");
    }

    let store = moneypot_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    store
        .health_check()
        .await
        .context("metadata store health check failed")?;
    tracing::info!("Metadata store initialized");

    let ledger = LedgerClient::new(config.ledger.clone()).context("failed to build ledger client")?;
    tracing::info!(base_url = %config.ledger.base_url, "Ledger client initialized");

    let reconciler: Arc<dyn ReconcilePort> = Arc::new(BucketReconciler::new(
        store.clone(),
        Arc::new(ledger),
        config.ledger.utc_offset_hours,
    ));
    let scheduler = BatchScheduler::new(store, reconciler, config.sync.clone());

    if args.once {
        let summary = scheduler.run_once().await?;
        tracing::info!(
            total = summary.total,
            errors = summary.errors,
            "single sweep complete, exiting"
        );
        return Ok(());
    }

    tracing::info!(
        interval_secs = config.sync.interval_secs,
        run_on_startup = config.sync.run_on_startup,
        "Entering reconciliation loop"
    );

    tokio::select! {
        _ = scheduler.run_loop() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
