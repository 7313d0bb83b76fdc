//! Chain Client (§4.2): one `alloy` RPC connection per chain, with
//! RPC-level retry and error classification at the boundary so callers
//! higher up never see a raw transport error.

use crate::error::{IndexerError, Result};
use crate::events::FeeEvent;
use crate::retry::RetryConfig;
use crate::types::{ChainId, EvmAddress};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::Filter;
use alloy::transports::http::{Client, Http};

/// The two operations the Scanner consumes from a chain-scoped client
/// (§4.2). A trait rather than a concrete type so the Scanner's window
/// loop can run against a stub in tests instead of a live `alloy`
/// provider — the same seam the teacher uses for `dyn Contract`.
pub trait ChainSource {
    fn chain_id(&self) -> ChainId;

    fn latest_block(&self) -> impl std::future::Future<Output = Result<u64>> + Send;

    fn fetch_events(
        &self,
        from: u64,
        to: u64,
    ) -> impl std::future::Future<Output = Result<Vec<FeeEvent>>> + Send;
}

/// Wraps a single chain's RPC endpoint and the contract it watches.
pub struct ChainClient {
    chain_id: ChainId,
    contract_address: EvmAddress,
    provider: RootProvider<Http<Client>>,
    retry: RetryConfig,
}

impl ChainClient {
    /// Connect to `rpc_url` over HTTP. Connection itself is not retried;
    /// a bad URL or unreachable endpoint fails fast at startup.
    pub fn connect(
        chain_id: ChainId,
        rpc_url: &str,
        contract_address: EvmAddress,
        retry: RetryConfig,
    ) -> Result<Self> {
        let url = rpc_url.parse().map_err(|e| {
            IndexerError::Configuration(format!("invalid RPC URL '{rpc_url}': {e}"))
        })?;
        let provider = ProviderBuilder::new().on_http(url);

        Ok(Self {
            chain_id,
            contract_address,
            provider,
            retry,
        })
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Latest block number known to the RPC endpoint (§4.5, window ceiling).
    pub async fn latest_block(&self) -> Result<u64> {
        let provider = &self.provider;
        self.retry
            .execute(|| async move { provider.get_block_number().await })
            .await
            .map_err(IndexerError::Blockchain)
    }

    /// Fetch and decode every `FeesCollected` log in `[from, to]`.
    ///
    /// `from` and `to` are both inclusive, matching `eth_getLogs`
    /// semantics. Returns `IndexerError::Validation` if the window is
    /// inverted, and `IndexerError::Blockchain` for any transport or
    /// decode failure.
    pub async fn fetch_events(&self, from: u64, to: u64) -> Result<Vec<FeeEvent>> {
        if from > to {
            return Err(IndexerError::Validation(format!(
                "invalid window: from ({from}) is greater than to ({to})"
            )));
        }

        let address: alloy::primitives::Address = self
            .contract_address
            .as_str()
            .parse()
            .map_err(|e| IndexerError::Validation(format!("invalid contract address: {e}")))?;

        let filter = Filter::new()
            .address(address)
            .from_block(from)
            .to_block(to);

        let logs = self
            .retry
            .execute(|| self.provider.get_logs(&filter))
            .await
            .map_err(IndexerError::Blockchain)?;

        logs.iter()
            .map(|log| FeeEvent::from_log(self.chain_id, &self.contract_address, log))
            .collect()
    }
}

impl ChainSource for ChainClient {
    fn chain_id(&self) -> ChainId {
        ChainClient::chain_id(self)
    }

    async fn latest_block(&self) -> Result<u64> {
        ChainClient::latest_block(self).await
    }

    async fn fetch_events(&self, from: u64, to: u64) -> Result<Vec<FeeEvent>> {
        ChainClient::fetch_events(self, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_rpc_url() {
        let contract = EvmAddress::new("0x1111111111111111111111111111111111111111").unwrap();
        let result = ChainClient::connect(
            ChainId::POLYGON,
            "not a url",
            contract,
            RetryConfig::default(),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn fetch_events_rejects_inverted_window() {
        let contract = EvmAddress::new("0x1111111111111111111111111111111111111111").unwrap();
        let client = ChainClient::connect(
            ChainId::POLYGON,
            "http://127.0.0.1:1",
            contract,
            RetryConfig::default(),
        )
        .unwrap();

        let err = client.fetch_events(100, 50).await.unwrap_err();
        assert!(matches!(err, IndexerError::Validation(_)));
    }
}
