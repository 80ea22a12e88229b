//! Ledger error types.

use thiserror::Error;

/// Errors from ledger access and the helpers around it.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// The HTTP request to the node failed.
    #[error("network error: {0}")]
    Network(String),

    /// The node answered with a JSON-RPC error.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node answered with something we could not interpret.
    #[error("malformed response: {0}")]
    InvalidResponse(String),

    /// An argument could not be converted for the call.
    #[error("{0}")]
    InvalidInput(String),

    /// A lookup found nothing.
    #[error("{0}")]
    NotFound(String),

    /// An ABI type string that does not name a Solidity type.
    #[error("unsupported ABI type: {0}")]
    UnsupportedAbiType(String),

    /// The signing key is missing or unusable.
    #[error("signer error: {0}")]
    Signer(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
