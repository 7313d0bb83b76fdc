//! `FeesCollected` event definition and decoding (§4.2, §6).
//!
//! The ABI is declared once via `alloy::sol!` and reused to decode every
//! log returned for the configured contract address. Fee amounts are kept
//! as decimal strings end to end; a `U256` never round-trips through a
//! float or an `i64`.

use crate::error::{IndexerError, Result};
use crate::types::{ChainId, EvmAddress, TxHash};
use alloy::primitives::Log as PrimitiveLog;
use alloy::rpc::types::Log as RpcLog;
use alloy::sol;
use alloy::sol_types::SolEvent;
use serde::{Deserialize, Serialize};

sol! {
    #[derive(Debug)]
    event FeesCollected(address indexed token, address indexed integrator, uint256 integratorFee, uint256 lifiFee);
}

/// One decoded, chain-tagged occurrence of `FeesCollected` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeEvent {
    pub chain_id: u64,
    pub contract_address: String,
    pub token: String,
    pub integrator: String,
    /// Decimal string; preserves full `uint256` precision.
    pub integrator_fee: String,
    /// Decimal string; preserves full `uint256` precision.
    pub lifi_fee: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub log_index: u64,
}

impl FeeEvent {
    /// Decode one raw RPC log into a `FeeEvent`, tagged with the chain it
    /// was fetched from.
    ///
    /// Every failure here — missing metadata, a log that doesn't decode as
    /// `FeesCollected`, or a decoded field that fails schema validation —
    /// is revalidation against §3's schema per §4.2, and surfaces as
    /// `IndexerError::Blockchain("invalid event data: ...")` so the
    /// Scanner aborts the chain's run rather than silently skipping the
    /// window (§4.5/§7).
    pub fn from_log(chain_id: ChainId, contract_address: &EvmAddress, log: &RpcLog) -> Result<Self> {
        let block_number = log.block_number.ok_or_else(|| {
            IndexerError::Blockchain("invalid event data: log is missing block_number".to_string())
        })?;
        let transaction_hash = log.transaction_hash.ok_or_else(|| {
            IndexerError::Blockchain(
                "invalid event data: log is missing transaction_hash".to_string(),
            )
        })?;
        let log_index = log.log_index.ok_or_else(|| {
            IndexerError::Blockchain("invalid event data: log is missing log_index".to_string())
        })?;

        let decoded = FeesCollected::decode_log(&log.inner, true).map_err(|e| {
            IndexerError::Blockchain(format!("invalid event data: failed to decode FeesCollected log: {e}"))
        })?;

        let tx_hash = TxHash::new(transaction_hash.to_string()).map_err(|e| {
            IndexerError::Blockchain(format!("invalid event data: {e}"))
        })?;

        Ok(Self {
            chain_id: chain_id.as_u64(),
            contract_address: contract_address.to_string(),
            token: format!("{:#x}", decoded.data.token),
            integrator: format!("{:#x}", decoded.data.integrator),
            integrator_fee: decoded.data.integratorFee.to_string(),
            lifi_fee: decoded.data.lifiFee.to_string(),
            block_number,
            transaction_hash: tx_hash.to_string(),
            log_index,
        })
    }

    /// Composite identity used for idempotent persistence (§4.4, §7).
    pub fn identity(&self) -> (u64, &str, u64) {
        (self.chain_id, &self.transaction_hash, self.log_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, B256, U256};

    fn sample_contract() -> EvmAddress {
        EvmAddress::new("0x3333333333333333333333333333333333333333").unwrap()
    }

    fn sample_log() -> RpcLog {
        let token = Address::repeat_byte(0x11);
        let integrator = Address::repeat_byte(0x22);
        let event = FeesCollected {
            token,
            integrator,
            integratorFee: U256::from(1_000_000_000_000_000_000u128),
            lifiFee: U256::from(500_000_000_000_000_000u128),
        };

        let encoded = event.encode_log_data();
        let primitive = PrimitiveLog {
            address: Address::repeat_byte(0x33),
            data: encoded,
        };

        let mut log = RpcLog::default();
        log.inner = primitive;
        log.block_number = Some(12345);
        log.transaction_hash = Some(B256::repeat_byte(0xaa));
        log.log_index = Some(7);
        log
    }

    #[test]
    fn decodes_fees_collected_log() {
        let contract = sample_contract();
        let log = sample_log();

        let event = FeeEvent::from_log(ChainId::POLYGON, &contract, &log).unwrap();
        assert_eq!(event.chain_id, 137);
        assert_eq!(event.integrator_fee, "1000000000000000000");
        assert_eq!(event.lifi_fee, "500000000000000000");
        assert_eq!(event.block_number, 12345);
        assert_eq!(event.log_index, 7);
    }

    #[test]
    fn rejects_log_without_block_number() {
        let contract = sample_contract();
        let mut log = sample_log();
        log.block_number = None;

        let err = FeeEvent::from_log(ChainId::POLYGON, &contract, &log).unwrap_err();
        assert!(matches!(err, IndexerError::Blockchain(_)));
    }

    #[test]
    fn identity_matches_composite_key() {
        let contract = sample_contract();
        let log = sample_log();
        let event = FeeEvent::from_log(ChainId::POLYGON, &contract, &log).unwrap();

        let (chain_id, tx_hash, log_index) = event.identity();
        assert_eq!(chain_id, 137);
        assert_eq!(tx_hash, event.transaction_hash);
        assert_eq!(log_index, 7);
    }
}
