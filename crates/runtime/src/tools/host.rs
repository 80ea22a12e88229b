//! Tool host trait.

use crate::model::{ToolCall, ToolSpec};
use crate::tools::ToolError;
use mcp::ToolOutcome;
use std::future::Future;

/// Trait for tool execution hosts.
///
/// Implementations provide tool specifications and execute tool calls.
/// This is the boundary between the conversation loop and side effects.
pub trait ToolHost: Send + Sync {
    /// The catalogue, fixed for the lifetime of the host.
    fn specs(&self) -> &[ToolSpec];

    /// Execute a tool call. Only a broken connection is an `Err`.
    fn execute(
        &self,
        call: &ToolCall,
    ) -> impl Future<Output = Result<ToolOutcome, ToolError>> + Send;
}
