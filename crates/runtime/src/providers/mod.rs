//! LLM provider adapters.
//!
//! Each provider implements the backend trait for its specific API.

mod anthropic;

pub use anthropic::{
    ANTHROPIC_API_URL, AnthropicBackend, AnthropicBackendBuilder, DEFAULT_MAX_TOKENS,
    DEFAULT_MODEL,
};
