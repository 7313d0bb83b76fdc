use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

use crate::chain_registry::ChainRegistry;
use crate::config::AppConfig;
use crate::db::Db;
use crate::http;
use crate::scanner::Scanner;

/// Multi-chain FeesCollected event indexer
#[derive(Parser, Debug)]
#[command(name = "fee-collector-indexer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML, TOML, or JSON)
    ///
    /// If not provided, uses default configuration with environment
    /// variable overrides. Config file settings can be overridden by
    /// the documented `ENABLED_CHAINS` / `<CHAIN>_RPC_URL` /
    /// `DATABASE_URL` / `CHUNK_SIZE` / `PORT` environment variables.
    #[arg(long, short = 'c', env = "FEES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan every enabled chain once, resuming from last progress.
    Scan,

    /// Run the indexing scheduler and the HTTP read API together.
    Serve,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let config = match &self.config {
            Some(path) => AppConfig::load_from_file(path).context("failed to load configuration")?,
            None => AppConfig::load().context("failed to load configuration")?,
        };
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

        let db = Arc::new(Db::connect(&config.database.url).await?);
        let registry = ChainRegistry::from_config(&config)?;

        match &self.command {
            Commands::Scan => {
                let scanner = Scanner::new(db, config.blockchain.chunk_size, config.retry.clone());
                let (_tx, rx) = watch::channel(false);
                scanner.run_all(&registry, rx).await;
                Ok(())
            }
            Commands::Serve => {
                let scanner = Scanner::new(db.clone(), config.blockchain.chunk_size, config.retry.clone());
                let (shutdown_tx, shutdown_rx) = watch::channel(false);
                let poll_interval =
                    std::time::Duration::from_secs(config.blockchain.poll_interval_seconds);

                let scan_registry = registry.clone();
                let scan_handle = tokio::spawn(async move {
                    scanner
                        .run_forever(&scan_registry, poll_interval, shutdown_rx)
                        .await
                });

                let app = http::router(db);
                let addr = format!("0.0.0.0:{}", config.http.port);
                let listener = tokio::net::TcpListener::bind(&addr).await?;
                tracing::info!(%addr, "HTTP read API listening");

                let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
                server.await?;

                let _ = shutdown_tx.send(true);
                let _ = scan_handle.await;
                Ok(())
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
