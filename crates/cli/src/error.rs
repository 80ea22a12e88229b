//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The server path has an extension we do not know how to run.
    #[error("server script must be a .js, .ts or .py file or an executable: {}", path.display())]
    UnsupportedServer { path: PathBuf },

    /// Configuration is invalid or missing required fields.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<runtime::ToolError> for Error {
    fn from(e: runtime::ToolError) -> Self {
        Self::Runtime(e.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
