use thiserror::Error;

/// Failures of the tool-serving connection itself.
///
/// A tool that runs and fails is not an error here: it comes back as
/// [`mcp::ToolOutcome::Failure`].
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ToolError {
    /// The server process could not be started or did not initialize.
    #[error("failed to launch tool server: {0}")]
    Launch(String),

    /// The connection to the server broke.
    #[error("tool server connection lost: {0}")]
    Transport(String),
}
