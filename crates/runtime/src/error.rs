use thiserror::Error;

use crate::model::ModelError;
use crate::tools::ToolError;

#[derive(Debug, Error)]
pub enum Error {
    /// The model call failed. Fatal to the current query only.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The tool server connection failed. Fatal to the session.
    #[error(transparent)]
    Transport(#[from] ToolError),
}

impl Error {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
