use anyhow::Result;
use clap::Parser;
use fee_collector_indexer::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };

    // `RUST_LOG` (the `EnvFilter` convention) wins if set; otherwise fall
    // back to the documented `LOG_LEVEL` (a bare level like `debug`,
    // scoped to this crate) before the verbosity-derived default (§6).
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| default_level.to_string());
        tracing_subscriber::EnvFilter::new(format!("fee_collector_indexer={level}"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli.execute().await
}
