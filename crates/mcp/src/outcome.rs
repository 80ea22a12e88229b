//! Tool invocation outcome shared by the serving and calling sides.

use serde::{Deserialize, Serialize};

use crate::protocol::{CallToolResult, ToolContent};

/// Outcome of one tool invocation.
///
/// Failures are data, not errors: the text explains what went wrong and is
/// handed to the model exactly like a successful result would be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success(String),
    Failure(String),
}

impl ToolOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self::Success(text.into())
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self::Failure(text.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The result or error text.
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Failure(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Success(text) | Self::Failure(text) => text,
        }
    }
}

impl From<ToolOutcome> for CallToolResult {
    fn from(outcome: ToolOutcome) -> Self {
        let is_error = !outcome.is_success();
        Self {
            content: vec![ToolContent::text(outcome.into_text())],
            is_error,
        }
    }
}
