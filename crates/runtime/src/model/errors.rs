use thiserror::Error;

/// Errors from model oracle calls.
///
/// All of these abort the current query only; the session continues.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A network error occurred during the API call.
    #[error("network: {0}")]
    Network(String),

    /// The credential was rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The provider returned an error response.
    #[error("provider api: {0}")]
    Api(String),

    /// The provider response could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
