//! Scanner (§4.5): the multi-chain chunked indexing engine.
//!
//! One cooperative task per enabled chain. Within a chain, windows run
//! strictly in sequence: `current..=windowEnd` is fetched, persisted, and
//! progress is advanced before the next window starts. A `BlockchainError`
//! or `DatabaseError` aborts that chain's task; anything else is logged
//! and the window is skipped.

use crate::chain_client::{ChainClient, ChainSource};
use crate::chain_registry::ChainRegistry;
use crate::db::events::EventStore;
use crate::db::progress::ProgressStore;
use crate::db::Db;
use crate::error::{IndexerError, Result};
use crate::types::{ChainId, EvmAddress};
use std::sync::Arc;
use tokio::sync::watch;

/// Shared, read-only context every chain's task runs against.
pub struct Scanner {
    db: Arc<Db>,
    chunk_size: u64,
    retry: crate::retry::RetryConfig,
}

impl Scanner {
    pub fn new(db: Arc<Db>, chunk_size: u64, retry: crate::retry::RetryConfig) -> Self {
        Self {
            db,
            chunk_size,
            retry,
        }
    }

    /// Launch one task per chain in `registry`, run them to completion in
    /// parallel, and return once every task has finished or aborted.
    ///
    /// `shutdown` is observed between windows; once it fires, no chain
    /// starts a new window, but the window already in flight is allowed to
    /// finish (§5 graceful shutdown).
    pub async fn run_all(&self, registry: &ChainRegistry, shutdown: watch::Receiver<bool>) {
        let mut handles = Vec::new();

        for descriptor in registry.all() {
            let chain_id = descriptor.chain_id;
            let rpc_url = descriptor.rpc_url.clone();
            let contract_address = descriptor.contract_address.clone();
            let start_block = descriptor.start_block;
            let db = self.db.clone();
            let chunk_size = self.chunk_size;
            let retry = self.retry.clone();
            let mut shutdown = shutdown.clone();

            handles.push(tokio::spawn(async move {
                let contract = match EvmAddress::new(contract_address) {
                    Ok(addr) => addr,
                    Err(e) => {
                        tracing::error!(%chain_id, error = %e, "invalid contract address; chain not started");
                        return;
                    }
                };

                let client = match ChainClient::connect(chain_id, &rpc_url, contract, retry) {
                    Ok(client) => client,
                    Err(e) => {
                        tracing::error!(%chain_id, error = %e, "failed to connect chain client; chain not started");
                        return;
                    }
                };

                match run_chain(&db, &client, chain_id, start_block, chunk_size, &mut shutdown).await {
                    Ok(()) => tracing::info!(%chain_id, "scan finished"),
                    Err(e) => tracing::error!(%chain_id, error = %e, "chain aborted"),
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "chain task panicked");
            }
        }
    }

    /// Run `run_all` repeatedly, pausing `poll_interval` between passes,
    /// until `shutdown` fires. Used by the `serve` subcommand so the
    /// indexer keeps pace with chain heads instead of exiting after the
    /// first pass.
    pub async fn run_forever(
        &self,
        registry: &ChainRegistry,
        poll_interval: std::time::Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            self.run_all(registry, shutdown.clone()).await;

            if *shutdown.borrow() {
                return;
            }

            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    /// Run a single chain to completion (§4.5 algorithm), for callers that
    /// want to drive one chain directly — e.g. the `scan` CLI subcommand
    /// or tests driving a stub `ChainSource`.
    pub async fn run_chain_once<C: ChainSource>(
        &self,
        client: &C,
        start_block: u64,
    ) -> Result<()> {
        let (_tx, rx) = watch::channel(false);
        run_chain(&self.db, client, client.chain_id(), start_block, self.chunk_size, &mut rx.clone()).await
    }
}

async fn run_chain<C: ChainSource>(
    db: &Db,
    client: &C,
    chain_id: ChainId,
    start_block: u64,
    chunk_size: u64,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<()> {
    if chunk_size == 0 {
        return Err(IndexerError::Configuration(
            "chunk_size must be at least 1".to_string(),
        ));
    }

    let progress = ProgressStore::new(db);
    let events = EventStore::new(db);

    let head = client.latest_block().await?;
    let cursor = progress.get(chain_id).await?;
    let from = match cursor {
        Some(c) => c + 1,
        None => start_block,
    };

    if from >= head {
        tracing::info!(%chain_id, from, head, "up to date");
        return Ok(());
    }

    let mut current = from;
    while current < head {
        if *shutdown.borrow() {
            tracing::info!(%chain_id, current, "shutdown requested; stopping before next window");
            return Ok(());
        }

        let window_end = (current + chunk_size - 1).min(head);

        match run_window(&events, &progress, client, chain_id, current, window_end).await {
            Ok(()) => {}
            Err(e) if e.aborts_chain() => return Err(e),
            Err(e) => {
                tracing::warn!(%chain_id, from = current, to = window_end, error = %e, "skipping window");
            }
        }

        current += chunk_size;
    }

    Ok(())
}

async fn run_window<C: ChainSource>(
    events: &EventStore<'_>,
    progress: &ProgressStore<'_>,
    client: &C,
    chain_id: ChainId,
    from: u64,
    to: u64,
) -> Result<()> {
    let fetched = client.fetch_events(from, to).await?;
    tracing::debug!(%chain_id, from, to, count = fetched.len(), "window fetched");

    events.insert_many(&fetched).await?;
    progress.set(chain_id, to).await?;

    Ok(())
}
