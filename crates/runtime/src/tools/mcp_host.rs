//! MCP-backed tool host.

use super::{McpClient, ToolError, ToolHost};
use crate::model::{ToolCall, ToolSpec};
use mcp::ToolOutcome;
use serde_json::{Map, Value};

/// Tool host backed by an MCP server. The catalogue is fetched once at
/// connect time.
pub struct McpToolHost {
    client: McpClient,
    specs: Vec<ToolSpec>,
}

impl From<rmcp::model::Tool> for ToolSpec {
    fn from(tool: rmcp::model::Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
            schema: Value::Object((*tool.input_schema).clone()),
        }
    }
}

impl McpToolHost {
    /// Spawn MCP server and cache tool specs.
    pub async fn spawn(
        command: impl AsRef<str>,
        args: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<Self, ToolError> {
        let client = McpClient::spawn(command, args).await?;
        let specs: Vec<ToolSpec> = client
            .list_tools()
            .await?
            .into_iter()
            .map(ToolSpec::from)
            .collect();
        tracing::info!(tools = specs.len(), "connected to tool server");
        Ok(Self { client, specs })
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.specs.iter().map(|spec| spec.name.as_str()).collect()
    }

    /// Terminate the server process.
    pub async fn shutdown(self) -> Result<(), ToolError> {
        self.client.shutdown().await
    }
}

/// Tool arguments must be a JSON object; `null` counts as empty.
fn arguments(input: &Value) -> Result<Map<String, Value>, String> {
    match input {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        other => Err(format!("tool arguments must be an object, got {other}")),
    }
}

impl ToolHost for McpToolHost {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolOutcome, ToolError> {
        if !self.specs.iter().any(|spec| spec.name == call.name) {
            tracing::warn!(tool = %call.name, "model requested an unknown tool");
            return Ok(ToolOutcome::failure(format!("unknown tool: {}", call.name)));
        }
        let arguments = match arguments(&call.input) {
            Ok(arguments) => arguments,
            Err(message) => return Ok(ToolOutcome::failure(message)),
        };
        self.client.call_tool(&call.name, arguments).await
    }
}
