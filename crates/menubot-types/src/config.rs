//! Global configuration for Menubot.
//!
//! Deserialized from `config.toml` in the data directory. Every field has
//! a default so a missing or partial file still yields a working config.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// When true, requests must carry the API key from `api_key_env`.
    pub api_key_enabled: bool,
    /// Environment variable holding the inbound API key.
    pub api_key_env: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            api_key_enabled: false,
            api_key_env: "MENUBOT_API_KEY".to_string(),
        }
    }
}

/// Model collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL. Defaults to Groq's endpoint.
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the provider API key.
    pub api_key_env: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Bounded retry count for transient failures.
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Sliding window: number of most recent turns sent as model context.
    pub history_window: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { history_window: 40 }
    }
}
