//! MCP tool server loop (newline-delimited JSON-RPC over stdio).

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::outcome::ToolOutcome;
use crate::protocol::{
    CallToolParams, CallToolResult, DEFAULT_PROTOCOL_VERSION, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities,
    ServerInfo, Tool, ToolsCapability,
};

/// Maximum accepted request size (1MB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// The tool catalogue a server exposes.
///
/// Implementations never fail a call: every problem is reported as a
/// [`ToolOutcome::Failure`].
pub trait ToolHandler: Send + Sync {
    /// The fixed tool catalogue, in registration order.
    fn tools(&self) -> Vec<Tool>;

    /// Invoke a tool by name with raw JSON arguments.
    fn call_tool(&self, name: &str, arguments: Value)
    -> impl Future<Output = ToolOutcome> + Send;
}

/// An MCP server answering requests with a [`ToolHandler`].
pub struct Server<H> {
    info: ServerInfo,
    handler: H,
}

impl<H: ToolHandler> Server<H> {
    pub fn new(info: ServerInfo, handler: H) -> Self {
        Self { info, handler }
    }

    /// Serve on the process's stdin/stdout until the client closes stdin.
    pub async fn serve_stdio(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        debug!(server = %self.info.name, "serving on stdio");
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited requests from `reader`, writing responses to
    /// `writer`. Returns when the reader reaches EOF.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();
        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                debug!("client closed the channel");
                return Ok(());
            }

            let message = line.trim();
            if message.is_empty() {
                continue;
            }

            let response = if message.len() > MAX_MESSAGE_SIZE {
                let error = Error::MessageTooLarge {
                    size: message.len(),
                    max: MAX_MESSAGE_SIZE,
                };
                warn!(%error, "rejecting request");
                Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::invalid_params(error),
                ))
            } else {
                self.handle_message(message).await
            };

            if let Some(response) = response {
                let mut json = serde_json::to_string(&response)?;
                json.push('\n');
                writer.write_all(json.as_bytes()).await?;
                writer.flush().await?;
            }
        }
    }

    /// Handle one raw message. Notifications produce no response.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "unparseable request");
                return Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::parse_error(e),
                ));
            }
        };

        let Some(id) = request.id else {
            debug!(method = %request.method, "notification");
            return None;
        };

        debug!(method = %request.method, ?id, "request");
        let response = match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(Some(id), error),
        };
        Some(response)
    }

    async fn dispatch(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> std::result::Result<Value, JsonRpcError> {
        match method {
            "initialize" => {
                let params: InitializeParams = parse_params(params)?;
                if let Some(client) = &params.client_info {
                    info!(client = %client.name, "client connected");
                }
                to_result(InitializeResult {
                    protocol_version: params
                        .protocol_version
                        .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string()),
                    capabilities: ServerCapabilities {
                        tools: Some(ToolsCapability::default()),
                    },
                    server_info: self.info.clone(),
                })
            }
            "ping" => Ok(Value::Object(Default::default())),
            "tools/list" => to_result(ListToolsResult {
                tools: self.handler.tools(),
            }),
            "tools/call" => {
                let params: CallToolParams = parse_params(params)?;
                let arguments = params
                    .arguments
                    .unwrap_or_else(|| Value::Object(Default::default()));
                let outcome = self.handler.call_tool(&params.name, arguments).await;
                debug!(tool = %params.name, success = outcome.is_success(), "tool call finished");
                to_result(CallToolResult::from(outcome))
            }
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }
}

fn parse_params<T: DeserializeOwned>(
    params: Option<Value>,
) -> std::result::Result<T, JsonRpcError> {
    let value = match params {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(value) => value,
    };
    serde_json::from_value(value).map_err(JsonRpcError::invalid_params)
}

fn to_result(value: impl Serialize) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(JsonRpcError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoHandler {
        calls: Mutex<Vec<String>>,
    }

    impl ToolHandler for EchoHandler {
        fn tools(&self) -> Vec<Tool> {
            vec![Tool {
                name: "echo".into(),
                description: Some("Echo the input".into()),
                input_schema: json!({"type": "object"}),
            }]
        }

        async fn call_tool(&self, name: &str, arguments: Value) -> ToolOutcome {
            self.calls.lock().unwrap().push(name.to_string());
            match name {
                "echo" => ToolOutcome::success(arguments["text"].as_str().unwrap_or_default()),
                other => ToolOutcome::failure(format!("unknown tool: {other}")),
            }
        }
    }

    async fn run(input: &str) -> Vec<Value> {
        let server = Server::new(ServerInfo::new("test", "0.0.0"), EchoHandler::default());
        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn initialize_echoes_protocol_version() {
        let responses = run(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"#,
            r#""protocolVersion":"2025-06-18","capabilities":{},"#,
            r#""clientInfo":{"name":"c","version":"1"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses.len(), 1);
        let result = &responses[0]["result"];
        assert_eq!(result["protocolVersion"], "2025-06-18");
        assert_eq!(result["serverInfo"]["name"], "test");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn lists_and_calls_tools() {
        let responses = run(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","#,
            r#""params":{"name":"echo","arguments":{"text":"hi"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"nope"}}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses[0]["result"]["tools"][0]["name"], "echo");
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["content"][0]["text"], "hi");
        assert_eq!(responses[1]["result"]["isError"], false);
        assert_eq!(responses[2]["result"]["isError"], true);
        assert_eq!(
            responses[2]["result"]["content"][0]["text"],
            "unknown tool: nope"
        );
    }

    #[tokio::test]
    async fn reports_protocol_errors() {
        let responses = run(concat!(
            "not json\n",
            "\n",
            r#"{"jsonrpc":"2.0","id":"a","method":"resources/list"}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert!(responses[0]["id"].is_null());
        assert_eq!(responses[1]["id"], "a");
        assert_eq!(responses[1]["error"]["code"], JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn ping_returns_empty_object() {
        let responses = run("{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n").await;
        assert_eq!(responses[0]["result"], json!({}));
    }
}
