//! Configuration loading from ledger-chat.toml and the environment.

use runtime::{
    ANTHROPIC_API_URL, AnthropicBackend, DEFAULT_MAX_TOKENS, DEFAULT_MAX_TOOL_DEPTH, DEFAULT_MODEL,
};
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE: &str = "ledger-chat.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,
}

/// Model backend configuration.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API key (sk-ant-api01-...). `ANTHROPIC_API_KEY` wins.
    pub api_key: Option<String>,

    /// Messages endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Optional system prompt.
    pub system: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_key: None,
            base_url: default_base_url(),
            system: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationConfig {
    /// How deep tool calls from follow-up responses are followed.
    #[serde(default = "default_max_tool_depth")]
    pub max_tool_depth: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_tool_depth: default_max_tool_depth(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_base_url() -> String {
    ANTHROPIC_API_URL.to_string()
}

fn default_max_tool_depth() -> usize {
    DEFAULT_MAX_TOOL_DEPTH
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load an explicitly given file, or `ledger-chat.toml` if it exists,
    /// or fall back to defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Apply `ANTHROPIC_API_KEY` and `ANTHROPIC_MODEL` from `lookup`.
    /// Empty values count as unset.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(key) = var("ANTHROPIC_API_KEY") {
            self.backend.api_key = Some(key);
        }
        if let Some(model) = var("ANTHROPIC_MODEL") {
            self.backend.model = model;
        }
        self
    }

    /// Build the model backend. Fails if no API key is configured.
    pub fn backend(&self) -> Result<AnthropicBackend, ConfigError> {
        let api_key = self
            .backend
            .api_key
            .as_deref()
            .ok_or(ConfigError::MissingApiKey)?;
        let mut builder = AnthropicBackend::builder(api_key, &self.backend.model)
            .max_tokens(self.backend.max_tokens)
            .base_url(&self.backend.base_url);
        if let Some(system) = &self.backend.system {
            builder = builder.system(system);
        }
        Ok(builder.build())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("ANTHROPIC_API_KEY is not set (or set backend.api_key in {CONFIG_FILE})")]
    MissingApiKey,
}
