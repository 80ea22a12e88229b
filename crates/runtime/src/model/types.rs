use super::errors::ModelError;
use mcp::ToolOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
    /// An injected tool result.
    ToolResult,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// The outcome of a tool call, fed back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub outcome: ToolOutcome,
}

/// A part of a turn, which can be text or a tool interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Part {
    Text(String),
    ToolCall(ToolCall),
    ToolResult(ToolResult),
}

/// One entry of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    pub fn tool_result(result: ToolResult) -> Self {
        Self {
            role: Role::ToolResult,
            parts: vec![Part::ToolResult(result)],
        }
    }

    /// Get combined text content from all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// The first text part, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            Part::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// The tool calls requested in this turn, in order.
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.parts.iter().filter_map(|part| match part {
            Part::ToolCall(call) => Some(call),
            _ => None,
        })
    }
}

/// A tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Everything needed for a model request.
#[derive(Debug, Clone)]
pub struct ModelRequest<'a> {
    pub turns: &'a [Turn],
    /// The tool catalogue, or `None` when the model must answer in text.
    pub tools: Option<&'a [ToolSpec]>,
}

/// The response from a model.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub message: Turn,
    pub usage: Usage,
}

/// Trait for LLM provider backends.
pub trait Backend: Send + Sync {
    fn call(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<ModelResponse, ModelError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_turn() -> Turn {
        Turn::model(vec![
            Part::ToolCall(ToolCall {
                id: "call_1".into(),
                name: "getLatestBlockNumber".into(),
                input: serde_json::json!({}),
            }),
            Part::Text("Hello ".into()),
            Part::Text("world".into()),
        ])
    }

    #[test]
    fn turn_text_extraction() {
        let turn = mixed_turn();
        assert_eq!(turn.text(), "Hello world");
        assert_eq!(turn.first_text(), Some("Hello "));
    }

    #[test]
    fn tool_call_extraction() {
        let turn = mixed_turn();
        let calls: Vec<&ToolCall> = turn.tool_calls().collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "getLatestBlockNumber");
    }

    #[test]
    fn tool_result_turn() {
        let turn = Turn::tool_result(ToolResult {
            tool_call_id: "call_1".into(),
            outcome: ToolOutcome::failure("boom"),
        });
        assert_eq!(turn.role, Role::ToolResult);
        assert!(turn.first_text().is_none());
    }
}
