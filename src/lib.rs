//! Multi-chain FeesCollected event indexer.
//!
//! Indexes `FeesCollected` events emitted by a fee-collector contract
//! deployed at the same address across several EVM chains, persists them
//! idempotently, and serves them through a small read API.

pub mod chain_client;
pub mod chain_registry;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod http;
pub mod retry;
pub mod scanner;
pub mod types;

pub use config::AppConfig;
pub use error::{IndexerError, Result};
pub use retry::RetryConfig;
pub use scanner::Scanner;
pub use types::{BlockNumber, ChainId, EvmAddress, TxHash};
