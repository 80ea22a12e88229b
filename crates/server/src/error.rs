//! Server error types.

use thiserror::Error;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum Error {
    /// An environment variable has a value we cannot use.
    #[error("invalid {var}: {source}")]
    Config {
        var: &'static str,
        #[source]
        source: ledger::LedgerError,
    },

    /// Building the tool registry failed.
    #[error(transparent)]
    Ledger(#[from] ledger::LedgerError),

    /// The MCP loop failed.
    #[error(transparent)]
    Mcp(#[from] mcp::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
