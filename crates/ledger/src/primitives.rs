//! Block identifiers, plus the alloy types used throughout the crate.

use std::str::FromStr;

pub use alloy_primitives::{Address, B256, U256};

use crate::LedgerError;

/// Parse a hex address, with or without `0x`.
pub fn parse_address(s: &str) -> Result<Address, LedgerError> {
    let s = s.trim();
    s.parse()
        .map_err(|e| LedgerError::InvalidInput(format!("invalid address `{s}`: {e}")))
}

/// Which block to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockId {
    Number(u64),
    Hash(B256),
    Tag(&'static str),
}

const BLOCK_TAGS: [&str; 5] = ["latest", "earliest", "pending", "safe", "finalized"];

impl FromStr for BlockId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(tag) = BLOCK_TAGS.iter().find(|tag| tag.eq_ignore_ascii_case(s)) {
            return Ok(Self::Tag(*tag));
        }
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            return s
                .parse()
                .map(Self::Number)
                .map_err(|e| LedgerError::InvalidInput(format!("invalid block number {s}: {e}")));
        }
        s.strip_prefix("0x")
            .and_then(|_| s.parse::<B256>().ok())
            .map(Self::Hash)
            .ok_or_else(|| {
                LedgerError::InvalidInput(format!(
                    "expected a block number or a 0x-prefixed 32-byte block hash, got `{s}`"
                ))
            })
    }
}
