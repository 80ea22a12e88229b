//! MCP error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
