//! Ethereum JSON-RPC ledger over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::hex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::primitives::{Address, BlockId, U256};

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// A [`Ledger`] backed by a node's JSON-RPC endpoint.
pub struct RpcLedger {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcLedger {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Issue one JSON-RPC request and return its `result`.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(method, id, "ledger request");

        let response = self
            .client
            .post(&self.url)
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Network(format!("HTTP {status}: {body}")));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

        if let Some(error) = body.error {
            tracing::debug!(method, code = error.code, "ledger request failed");
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(body.result.unwrap_or(Value::Null))
    }

    async fn quantity(&self, method: &str, params: Value) -> Result<U256> {
        parse_quantity(&self.request(method, params).await?)
    }

    async fn optional(&self, method: &str, params: Value) -> Result<Option<Value>> {
        let value = self.request(method, params).await?;
        Ok((!value.is_null()).then_some(value))
    }
}

/// Parse a hex `QUANTITY` such as `0x3e8`.
pub fn parse_quantity(value: &Value) -> Result<U256> {
    let s = value.as_str().ok_or_else(|| {
        LedgerError::InvalidResponse(format!("expected hex quantity, got {value}"))
    })?;
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::InvalidResponse(format!("quantity missing 0x prefix: {s}")))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::InvalidResponse(format!("invalid quantity {s}: {e}")))
}

fn narrow<T: TryFrom<U256>>(n: U256) -> Result<T> {
    T::try_from(n)
        .map_err(|_| LedgerError::InvalidResponse(format!("quantity {n} is out of range")))
}

fn block_params(id: &BlockId) -> (&'static str, Value) {
    match id {
        BlockId::Number(n) => ("eth_getBlockByNumber", json!([format!("{n:#x}"), false])),
        BlockId::Tag(tag) => ("eth_getBlockByNumber", json!([tag, false])),
        BlockId::Hash(hash) => ("eth_getBlockByHash", json!([hash.to_string(), false])),
    }
}

impl Ledger for RpcLedger {
    async fn chain_id(&self) -> Result<u64> {
        narrow(self.quantity("eth_chainId", json!([])).await?)
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.quantity("eth_getBalance", json!([address.to_string(), "latest"]))
            .await
    }

    async fn block_number(&self) -> Result<u64> {
        narrow(self.quantity("eth_blockNumber", json!([])).await?)
    }

    async fn gas_price(&self) -> Result<u128> {
        narrow(self.quantity("eth_gasPrice", json!([])).await?)
    }

    async fn transaction(&self, hash: &str) -> Result<Option<Value>> {
        self.optional("eth_getTransactionByHash", json!([hash])).await
    }

    async fn receipt(&self, hash: &str) -> Result<Option<Value>> {
        self.optional("eth_getTransactionReceipt", json!([hash])).await
    }

    async fn block(&self, id: &BlockId) -> Result<Option<Value>> {
        let (method, params) = block_params(id);
        self.optional(method, params).await
    }

    async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        let call = json!({ "to": to.to_string(), "data": hex::encode_prefixed(data) });
        let params = json!([call, "latest"]);
        let result = self.request("eth_call", params).await?;
        let data = result.as_str().ok_or_else(|| {
            LedgerError::InvalidResponse(format!("expected call data, got {result}"))
        })?;
        hex::decode(data)
            .map_err(|e| LedgerError::InvalidResponse(format!("invalid call data: {e}")))
    }

    async fn nonce(&self, address: Address) -> Result<u64> {
        narrow(
            self.quantity("eth_getTransactionCount", json!([address.to_string(), "pending"]))
                .await?,
        )
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<String> {
        let result = self
            .request("eth_sendRawTransaction", json!([hex::encode_prefixed(raw)]))
            .await?;
        result.as_str().map(str::to_string).ok_or_else(|| {
            LedgerError::InvalidResponse(format!("expected transaction hash, got {result}"))
        })
    }
}
