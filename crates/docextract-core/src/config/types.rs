//! Sub-configuration structs with their defaults.

use crate::model::Provider;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// File holding cached OCR results, keyed by image hash
    pub ocr_cache: PathBuf,

    /// Append-only file receiving one line per logged evaluation run
    pub results_log: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            ocr_cache: PathBuf::from(".ocr_cache"),
            results_log: PathBuf::from("results.txt"),
        }
    }
}

/// Resource limits for external calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// LLM call timeout in milliseconds
    pub llm_timeout_ms: u64,

    /// OCR request timeout in milliseconds
    pub ocr_timeout_ms: u64,

    /// Maximum tokens the model may generate
    pub max_tokens: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            llm_timeout_ms: 120_000,
            ocr_timeout_ms: 60_000,
            max_tokens: 4096,
        }
    }
}

impl LimitsConfig {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_millis(self.ocr_timeout_ms)
    }
}

/// Maximum simultaneous in-flight extraction calls per provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub openai: usize,
    pub vertexai: usize,
    pub mistral: usize,
    /// Anthropic is rate limited aggressively, so calls are serialized
    pub anthropic: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            openai: 5,
            vertexai: 5,
            mistral: 5,
            anthropic: 1,
        }
    }
}

impl ConcurrencyConfig {
    pub fn permits(&self, provider: Provider) -> usize {
        match provider {
            Provider::OpenAi => self.openai,
            Provider::VertexAi => self.vertexai,
            Provider::Mistral => self.mistral,
            Provider::Anthropic => self.anthropic,
        }
    }
}

/// Fixed delay applied before each model call, per provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub openai_ms: u64,
    pub vertexai_ms: u64,
    pub mistral_ms: u64,
    pub anthropic_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            openai_ms: 0,
            vertexai_ms: 0,
            mistral_ms: 0,
            anthropic_ms: 10_000,
        }
    }
}

impl ThrottleConfig {
    pub fn delay(&self, provider: Provider) -> Duration {
        let ms = match provider {
            Provider::OpenAi => self.openai_ms,
            Provider::VertexAi => self.vertexai_ms,
            Provider::Mistral => self.mistral_ms,
            Provider::Anthropic => self.anthropic_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Document rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Character grid width used by the layout-preserving renderer
    pub latin_columns: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { latin_columns: 120 }
    }
}

/// OCR service settings (Google Cloud Vision).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// API endpoint
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com".to_string(),
            api_key: "${GOOGLE_VISION_API_KEY}".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// LLM provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI configuration
    pub openai: Option<OpenAiConfig>,

    /// Vertex AI (Gemini) configuration
    pub vertexai: Option<VertexAiConfig>,

    /// Mistral configuration
    pub mistral: Option<MistralConfig>,

    /// Anthropic configuration
    pub anthropic: Option<AnthropicConfig>,
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Chat Completions endpoint
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: "${OPENAI_API_KEY}".to_string(),
        }
    }
}

/// Vertex AI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexAiConfig {
    /// GCP project id (supports ${ENV_VAR} syntax)
    pub project: String,

    /// GCP region
    pub location: String,

    /// OAuth access token (supports ${ENV_VAR} syntax)
    pub access_token: String,
}

impl Default for VertexAiConfig {
    fn default() -> Self {
        Self {
            project: "${GOOGLE_CLOUD_PROJECT}".to_string(),
            location: "us-central1".to_string(),
            access_token: "${VERTEXAI_ACCESS_TOKEN}".to_string(),
        }
    }
}

/// Mistral configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MistralConfig {
    /// API base URL (supports ${ENV_VAR} syntax)
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,
}

impl MistralConfig {
    /// Used when the endpoint setting resolves to nothing.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.mistral.ai/v1";
}

impl Default for MistralConfig {
    fn default() -> Self {
        Self {
            endpoint: "${MISTRAL_ENDPOINT}".to_string(),
            api_key: "${MISTRAL_API_KEY}".to_string(),
        }
    }
}

/// Anthropic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Messages API endpoint
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            api_key: "${ANTHROPIC_API_KEY}".to_string(),
        }
    }
}
