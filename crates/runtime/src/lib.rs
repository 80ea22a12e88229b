//! Runtime for ledger-chat: model backends, the tool host and the
//! conversation loop.
//!
//! # Overview
//!
//! - **Backend**: a trait abstracting model providers (Anthropic).
//! - **ToolHost**: a trait abstracting where tool calls go. [`McpToolHost`]
//!   runs them on an MCP server spawned as a child process.
//! - **Conversation**: resolves one user query, dispatching tool calls in
//!   the order the model emitted them.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{AnthropicBackend, Conversation, McpToolHost};
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = AnthropicBackend::builder("sk-ant-api01-...", "claude-sonnet-4-20250514").build();
//! let tools = McpToolHost::spawn("target/release/ledger-mcp", Vec::<String>::new()).await?;
//!
//! let conversation = Conversation::new(backend, tools);
//! let answer = conversation.process_query("What is the latest block?").await?;
//! println!("{answer}");
//! conversation.into_tools().shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod conversation;
mod error;
pub mod model;
mod providers;
pub mod tools;

pub use conversation::{Conversation, DEFAULT_MAX_TOOL_DEPTH, tool_marker};
pub use error::{Error, Result};
pub use model::{
    Backend, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolResult, ToolSpec,
    Turn,
};
pub use providers::{
    ANTHROPIC_API_URL, AnthropicBackend, AnthropicBackendBuilder, DEFAULT_MAX_TOKENS,
    DEFAULT_MODEL,
};
pub use tools::{McpClient, McpToolHost, ToolError, ToolHost};
