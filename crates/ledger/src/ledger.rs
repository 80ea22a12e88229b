use std::future::Future;

use serde_json::Value;

use crate::error::Result;
use crate::primitives::{Address, BlockId, U256};

/// Read and write access to an Ethereum-style ledger.
///
/// Amounts are in wei. Lookups that can legitimately find nothing
/// (transactions, receipts, blocks) return `Ok(None)` rather than an error.
pub trait Ledger: Send + Sync {
    fn chain_id(&self) -> impl Future<Output = Result<u64>> + Send;

    fn balance(&self, address: Address) -> impl Future<Output = Result<U256>> + Send;

    fn block_number(&self) -> impl Future<Output = Result<u64>> + Send;

    fn gas_price(&self) -> impl Future<Output = Result<u128>> + Send;

    fn transaction(&self, hash: &str) -> impl Future<Output = Result<Option<Value>>> + Send;

    fn receipt(&self, hash: &str) -> impl Future<Output = Result<Option<Value>>> + Send;

    fn block(&self, id: &BlockId) -> impl Future<Output = Result<Option<Value>>> + Send;

    /// Execute a read-only call against the latest block.
    fn call(&self, to: Address, data: &[u8]) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Transaction count including pending transactions.
    fn nonce(&self, address: Address) -> impl Future<Output = Result<u64>> + Send;

    /// Submit a signed transaction, returning its hash.
    fn send_raw_transaction(&self, raw: &[u8]) -> impl Future<Output = Result<String>> + Send;
}
