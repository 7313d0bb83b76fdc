//! Type-safe wrappers for blockchain primitives.
//!
//! Newtypes over plain `String`/`u64` so an address can't be passed where a
//! hash is expected, and so validation happens once, at construction.

use crate::error::{IndexerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 20-byte hex address (42 chars incl. `0x`), normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvmAddress(String);

impl EvmAddress {
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let addr = address.into();

        if !addr.starts_with("0x") {
            return Err(IndexerError::Validation(format!(
                "invalid address '{addr}': must start with 0x"
            )));
        }
        if addr.len() != 42 {
            return Err(IndexerError::Validation(format!(
                "invalid address '{addr}': must be 42 characters (0x + 40 hex chars), got {}",
                addr.len()
            )));
        }
        if !addr[2..].chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IndexerError::Validation(format!(
                "invalid address '{addr}': contains non-hex characters"
            )));
        }

        Ok(Self(addr.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 32-byte hex hash (66 chars incl. `0x`), normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Result<Self> {
        let hash = hash.into();

        if !hash.starts_with("0x") {
            return Err(IndexerError::Validation(format!(
                "invalid transaction hash '{hash}': must start with 0x"
            )));
        }
        if hash.len() != 66 {
            return Err(IndexerError::Validation(format!(
                "invalid transaction hash '{hash}': must be 66 characters (0x + 64 hex chars), got {}",
                hash.len()
            )));
        }
        if !hash[2..].chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IndexerError::Validation(format!(
                "invalid transaction hash '{hash}': contains non-hex characters"
            )));
        }

        Ok(Self(hash.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the supported EVM chains (closed set, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const ETHEREUM: ChainId = ChainId(1);
    pub const OPTIMISM: ChainId = ChainId(10);
    pub const BSC: ChainId = ChainId(56);
    pub const GNOSIS: ChainId = ChainId(100);
    pub const POLYGON: ChainId = ChainId(137);
    pub const BASE: ChainId = ChainId(8453);

    /// The closed set of chain identifiers this indexer knows how to run.
    pub const SUPPORTED: [ChainId; 6] = [
        Self::ETHEREUM,
        Self::OPTIMISM,
        Self::BSC,
        Self::GNOSIS,
        Self::POLYGON,
        Self::BASE,
    ];

    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Block number on a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockNumber(pub u64);

impl BlockNumber {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BlockNumber {
    fn from(block: u64) -> Self {
        Self(block)
    }
}

impl From<BlockNumber> for u64 {
    fn from(block: BlockNumber) -> Self {
        block.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_normalizes_case() {
        let a = EvmAddress::new("0xABCDEF1234567890ABCDef1234567890abcDEF12").unwrap();
        let b = EvmAddress::new("0xabcdef1234567890abcdef1234567890abcdef12").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn address_missing_0x() {
        let err = EvmAddress::new("abcdef1234567890abcdef1234567890abcdef12").unwrap_err();
        assert!(err.to_string().contains("must start with 0x"));
    }

    #[test]
    fn address_wrong_length() {
        let err = EvmAddress::new("0x123").unwrap_err();
        assert!(err.to_string().contains("42 characters"));
    }

    #[test]
    fn address_invalid_hex() {
        let err = EvmAddress::new("0x123456789012345678901234567890123456zzzz").unwrap_err();
        assert!(err.to_string().contains("non-hex"));
    }

    #[test]
    fn tx_hash_wrong_length() {
        let err = TxHash::new("0xdead").unwrap_err();
        assert!(err.to_string().contains("66 characters"));
    }

    #[test]
    fn tx_hash_valid() {
        let hash = TxHash::new(format!("0x{}", "cc".repeat(32))).unwrap();
        assert_eq!(hash.as_str().len(), 66);
    }

    #[test]
    fn chain_id_supported_set() {
        assert!(ChainId::POLYGON.is_supported());
        assert!(!ChainId(999).is_supported());
    }

    #[test]
    fn block_number_conversions() {
        let block = BlockNumber::from(12345u64);
        assert_eq!(block.as_u64(), 12345);
        assert_eq!(u64::from(block), 12345);
    }
}
