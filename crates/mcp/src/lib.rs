//! MCP (Model Context Protocol) server library.
//!
//! This crate serves a fixed tool catalogue to an MCP client over stdio.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Server, ServerInfo, Tool, ToolHandler, ToolOutcome};
//! use serde_json::Value;
//!
//! struct Clock;
//!
//! impl ToolHandler for Clock {
//!     fn tools(&self) -> Vec<Tool> {
//!         vec![Tool {
//!             name: "now".to_string(),
//!             description: Some("Current unix time".to_string()),
//!             input_schema: serde_json::json!({"type": "object"}),
//!         }]
//!     }
//!
//!     async fn call_tool(&self, _name: &str, _arguments: Value) -> ToolOutcome {
//!         ToolOutcome::success("0")
//!     }
//! }
//!
//! # async fn example() -> mcp::Result<()> {
//! let server = Server::new(ServerInfo::new("clock", "1.0.0"), Clock);
//! server.serve_stdio().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod outcome;
mod protocol;
mod server;

pub use error::{Error, Result};
pub use outcome::ToolOutcome;
pub use protocol::{
    CallToolParams, CallToolResult, DEFAULT_PROTOCOL_VERSION, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, RequestId, ServerCapabilities,
    ServerInfo, Tool, ToolContent,
};
pub use server::{MAX_MESSAGE_SIZE, Server, ToolHandler};
