//! Chain Registry (§4.1).
//!
//! Resolves process configuration into an ordered list of chain
//! descriptors the Scanner iterates over, plus a lookup by chain id.
//! Construction is the only place configuration errors are fatal; once a
//! `ChainRegistry` exists, every descriptor in it is known-good.

use crate::config::AppConfig;
use crate::error::{IndexerError, Result};
use crate::types::ChainId;

/// Everything the Scanner and Chain Client need to operate on one chain.
#[derive(Debug, Clone)]
pub struct ChainDescriptor {
    pub chain_id: ChainId,
    pub rpc_url: String,
    pub contract_address: String,
    pub start_block: u64,
}

#[derive(Debug, Clone)]
pub struct ChainRegistry {
    descriptors: Vec<ChainDescriptor>,
}

impl ChainRegistry {
    /// Build a registry from application configuration.
    ///
    /// Fails fast (§4.1 Errors) if an enabled chain id is outside the
    /// supported set, or is enabled without a configured RPC URL.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        if config.enabled_chains.is_empty() {
            return Err(IndexerError::Configuration(
                "no chains enabled; set ENABLED_CHAINS or chains configuration".to_string(),
            ));
        }

        let mut descriptors = Vec::with_capacity(config.enabled_chains.len());

        for &raw_chain_id in &config.enabled_chains {
            let chain_id = ChainId::from(raw_chain_id);

            if !chain_id.is_supported() {
                return Err(IndexerError::Configuration(format!(
                    "chain id {raw_chain_id} is not one of the supported chains {:?}",
                    ChainId::SUPPORTED.map(|c| c.as_u64())
                )));
            }

            let chain_config = config.chains.get(&raw_chain_id);
            let rpc_url = chain_config
                .and_then(|c| c.rpc_url.clone())
                .filter(|url| !url.is_empty())
                .ok_or_else(|| {
                    IndexerError::Configuration(format!(
                        "chain {raw_chain_id} is enabled but has no RPC URL configured"
                    ))
                })?;

            let start_block = chain_config.map(|c| c.start_block).unwrap_or(0);

            descriptors.push(ChainDescriptor {
                chain_id,
                rpc_url,
                contract_address: config.contract_address.clone(),
                start_block,
            });
        }

        Ok(Self { descriptors })
    }

    /// All enabled chain descriptors, in configured order.
    pub fn all(&self) -> &[ChainDescriptor] {
        &self.descriptors
    }

    /// Look up a descriptor by chain id.
    pub fn find(&self, chain_id: ChainId) -> Option<&ChainDescriptor> {
        self.descriptors.iter().find(|d| d.chain_id == chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;

    fn base_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.contract_address = "0x1111111111111111111111111111111111111111".to_string();
        config
    }

    #[test]
    fn builds_descriptor_for_each_enabled_chain() {
        let mut config = base_config();
        config.enabled_chains = vec![1, 137];
        config.chains.insert(
            1,
            ChainConfig {
                chain_id: 1,
                rpc_url: Some("https://eth.example".to_string()),
                start_block: 100,
            },
        );
        config.chains.insert(
            137,
            ChainConfig {
                chain_id: 137,
                rpc_url: Some("https://polygon.example".to_string()),
                start_block: 200,
            },
        );

        let registry = ChainRegistry::from_config(&config).unwrap();
        assert_eq!(registry.all().len(), 2);
        assert_eq!(registry.find(ChainId::POLYGON).unwrap().start_block, 200);
    }

    #[test]
    fn rejects_unsupported_chain() {
        let mut config = base_config();
        config.enabled_chains = vec![9999];
        let err = ChainRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, IndexerError::Configuration(_)));
    }

    #[test]
    fn rejects_enabled_chain_without_rpc_url() {
        let mut config = base_config();
        config.enabled_chains = vec![1];
        let err = ChainRegistry::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("no RPC URL configured"));
    }

    #[test]
    fn rejects_empty_enabled_chains() {
        let mut config = base_config();
        config.enabled_chains = vec![];
        let err = ChainRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, IndexerError::Configuration(_)));
    }
}
