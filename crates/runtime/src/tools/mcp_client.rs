//! MCP (Model Context Protocol) client over a child process.
//!
//! # Example
//!
//! ```ignore
//! use runtime::McpClient;
//!
//! # async fn example() -> Result<(), runtime::ToolError> {
//! let client = McpClient::spawn("node", ["build/index.js"]).await?;
//!
//! let tools = client.list_tools().await?;
//! for tool in &tools {
//!     println!("Tool: {}", tool.name);
//! }
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use mcp::ToolOutcome;
use rmcp::{
    RoleClient, ServiceExt,
    model::{CallToolRequestParams, CallToolResult, RawContent, Tool},
    service::{RunningService, ServiceError},
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use serde_json::{Map, Value};
use tokio::process::Command;

use super::ToolError;

/// An MCP client connected to a server process.
pub struct McpClient {
    service: RunningService<RoleClient, ()>,
}

impl McpClient {
    /// Spawn an MCP server and connect to it.
    ///
    /// # Arguments
    ///
    /// * `command` - The program to run (e.g., "node")
    /// * `args` - Arguments to pass to the program
    pub async fn spawn(
        command: impl AsRef<str>,
        args: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self, ToolError> {
        let command_str = command.as_ref().to_string();
        let args_vec: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        tracing::info!(command = %command_str, args = ?args_vec, "spawning tool server");

        let transport = TokioChildProcess::new(Command::new(&command_str).configure(|cmd| {
            for arg in &args_vec {
                cmd.arg(arg);
            }
        }))
        .map_err(|e| ToolError::Launch(format!("{command_str}: {e}")))?;

        let service = ()
            .serve(transport)
            .await
            .map_err(|e| ToolError::Launch(e.to_string()))?;

        Ok(Self { service })
    }

    /// List available tools from the server.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, ToolError> {
        let response = self
            .service
            .list_tools(Default::default())
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;
        Ok(response.tools)
    }

    /// Call a tool. A JSON-RPC error from the server becomes a failed
    /// outcome; anything else wrong with the channel is a [`ToolError`].
    pub async fn call_tool(
        &self,
        name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Result<ToolOutcome, ToolError> {
        let params = CallToolRequestParams {
            name: name.into().into(),
            arguments: Some(arguments),
            meta: None,
            task: None,
        };

        match self.service.call_tool(params).await {
            Ok(result) => Ok(outcome_from_result(result)),
            Err(ServiceError::McpError(error)) => {
                Ok(ToolOutcome::failure(error.message.to_string()))
            }
            Err(e) => Err(ToolError::Transport(e.to_string())),
        }
    }

    /// Shut down the client and terminate the server process.
    pub async fn shutdown(self) -> Result<(), ToolError> {
        let reason = self
            .service
            .cancel()
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;
        tracing::debug!(?reason, "tool server connection closed");
        Ok(())
    }
}

/// Concatenate the text blocks of a result.
pub(crate) fn outcome_from_result(result: CallToolResult) -> ToolOutcome {
    let text = result
        .content
        .into_iter()
        .filter_map(|content| match content.raw {
            RawContent::Text(text) => Some(text.text),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    if result.is_error.unwrap_or(false) {
        ToolOutcome::Failure(text)
    } else {
        ToolOutcome::Success(text)
    }
}
