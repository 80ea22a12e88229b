//! Anthropic Messages API backend.

use crate::model::{
    Backend, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolSpec, Turn, Usage,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: ApiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Blocks(Vec<ApiContentBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiResponseBlock>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicBackendBuilder {
    api_key: String,
    model: String,
    max_tokens: u32,
    system: Option<String>,
    base_url: String,
}

impl AnthropicBackendBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system: None,
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Override the Messages endpoint, e.g. for a proxy.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build(self) -> AnthropicBackend {
        AnthropicBackend {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
            max_tokens: self.max_tokens,
            system: self.system,
            base_url: self.base_url,
        }
    }
}

/// Anthropic API backend.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    system: Option<String>,
    base_url: String,
}

impl AnthropicBackend {
    pub fn builder(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> AnthropicBackendBuilder {
        AnthropicBackendBuilder::new(api_key, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::User | Role::ToolResult => "user",
            Role::Model => "assistant",
        }
    }

    /// Tool results travel as user text: the tool_use blocks that produced
    /// them are not echoed back, so there is no id to pair them with.
    fn turn_to_api(turn: &Turn) -> ApiMessage {
        let role = Self::role_to_api(turn.role);

        // Simple case: single text part
        if let [Part::Text(text)] = turn.parts.as_slice() {
            return ApiMessage {
                role,
                content: ApiContent::Text(text.clone()),
            };
        }

        let blocks: Vec<ApiContentBlock> = turn
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(ApiContentBlock::Text { text: text.clone() }),
                Part::ToolResult(result) => Some(ApiContentBlock::Text {
                    text: result.outcome.text().to_string(),
                }),
                Part::ToolCall(_) => None,
            })
            .collect();

        ApiMessage {
            role,
            content: ApiContent::Blocks(blocks),
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool<'_> {
        ApiTool {
            name: &spec.name,
            description: &spec.description,
            input_schema: &spec.schema,
        }
    }

    fn build_request<'a>(&'a self, request: &ModelRequest<'a>) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: request.turns.iter().map(Self::turn_to_api).collect(),
            system: self.system.as_deref(),
            tools: request
                .tools
                .unwrap_or_default()
                .iter()
                .map(Self::tool_to_api)
                .collect(),
        }
    }

    fn response_to_turn(blocks: Vec<ApiResponseBlock>) -> Turn {
        let parts: Vec<Part> = blocks
            .into_iter()
            .filter_map(|block| match block {
                ApiResponseBlock::Text { text } => Some(Part::Text(text)),
                ApiResponseBlock::ToolUse { id, name, input } => {
                    Some(Part::ToolCall(ToolCall { id, name, input }))
                }
                ApiResponseBlock::Unknown => None,
            })
            .collect();

        Turn::model(parts)
    }
}

impl std::fmt::Display for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anthropic({})", self.model)
    }
}

impl Backend for AnthropicBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = self.build_request(&request);
        tracing::debug!(
            model = %self.model,
            turns = api_request.messages.len(),
            tools = api_request.tools.len(),
            "querying model"
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ModelError::Auth(format!("{status}: {body}"))
                }
                _ => ModelError::Api(format!("{status}: {body}")),
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let message = Self::response_to_turn(api_response.content);
        let usage = Usage {
            input_tokens: api_response.usage.input_tokens,
            output_tokens: api_response.usage.output_tokens,
        };

        Ok(ModelResponse { message, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolResult;
    use mcp::ToolOutcome;
    use serde_json::json;

    fn backend() -> AnthropicBackend {
        AnthropicBackend::builder("test-key", DEFAULT_MODEL).build()
    }

    #[test]
    fn builder_defaults() {
        let backend = backend();
        assert_eq!(backend.model(), DEFAULT_MODEL);
        assert_eq!(backend.max_tokens, 1000);
        assert_eq!(backend.base_url, ANTHROPIC_API_URL);
        assert_eq!(backend.to_string(), format!("anthropic({DEFAULT_MODEL})"));
    }

    #[test]
    fn tools_omitted_without_catalogue() {
        let backend = backend();
        let turns = [Turn::user("hi")];
        let request = ModelRequest {
            turns: &turns,
            tools: None,
        };
        let body = serde_json::to_value(backend.build_request(&request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("system").is_none());
        assert_eq!(body["messages"], json!([{ "role": "user", "content": "hi" }]));
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn tool_results_are_user_text() {
        let backend = AnthropicBackend::builder("test-key", DEFAULT_MODEL)
            .system("be brief")
            .build();
        let specs = [ToolSpec {
            name: "getLatestBlockNumber".into(),
            description: "Get the latest block number".into(),
            schema: json!({ "type": "object" }),
        }];
        let turns = [
            Turn::user("latest block?"),
            Turn::tool_result(ToolResult {
                tool_call_id: "toolu_1".into(),
                outcome: ToolOutcome::success("19000000"),
            }),
        ];
        let request = ModelRequest {
            turns: &turns,
            tools: Some(&specs),
        };
        let body = serde_json::to_value(backend.build_request(&request)).unwrap();
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["tools"][0]["name"], "getLatestBlockNumber");
        assert_eq!(body["tools"][0]["input_schema"], json!({ "type": "object" }));
        assert_eq!(
            body["messages"][1],
            json!({ "role": "user", "content": [{ "type": "text", "text": "19000000" }] })
        );
    }

    #[test]
    fn parses_mixed_response() {
        let response: ApiResponse = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "Let me check." },
                {
                    "type": "tool_use",
                    "id": "toolu_1",
                    "name": "getEthBalance",
                    "input": { "address": "0x01" }
                },
                { "type": "thinking", "thinking": "..." }
            ],
            "usage": { "input_tokens": 10, "output_tokens": 5 }
        }))
        .unwrap();
        let turn = AnthropicBackend::response_to_turn(response.content);
        assert_eq!(turn.role, Role::Model);
        assert_eq!(turn.parts.len(), 2);
        assert_eq!(turn.first_text(), Some("Let me check."));
        let names: Vec<&str> = turn.tool_calls().map(|call| call.name.as_str()).collect();
        assert_eq!(names, ["getEthBalance"]);
    }
}
