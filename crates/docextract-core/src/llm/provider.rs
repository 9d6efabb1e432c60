//! Chat model trait, response type and client factory.
//!
//! Defines the interface that all LLM providers implement, plus the factory
//! that builds the right client for a [`ModelId`].

use crate::config::{Config, LimitsConfig, LlmConfig, MistralConfig};
use crate::error::ExtractError;
use crate::model::{ModelId, Provider};
use crate::prompt::ChatMessage;
use async_trait::async_trait;
use std::time::Duration;

/// Sampling temperature for every provider; extraction must be repeatable.
pub const TEMPERATURE: f32 = 0.0;

/// Generation settings shared by all provider clients.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl GenerationSettings {
    pub fn from_limits(limits: &LimitsConfig) -> Self {
        Self {
            temperature: TEMPERATURE,
            max_tokens: limits.max_tokens,
            timeout: limits.llm_timeout(),
        }
    }
}

/// The response from a chat model call.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Generated text
    pub text: String,
    /// Model identifier reported by the provider
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all chat model clients implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn ChatModel>` for dynamic dispatch).
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Provider name for logging (e.g., "anthropic", "vertexai").
    fn name(&self) -> &str;

    /// Send the rendered prompt and wait for the complete reply.
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, ExtractError>;

    /// Per-request timeout for this client.
    fn timeout(&self) -> Duration;
}

/// Builds chat clients for validated model identifiers.
pub trait ChatModelFactory: Send + Sync {
    fn create(&self, model: &ModelId) -> Result<Box<dyn ChatModel>, ExtractError>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn missing_credential(what: &str, var: &str) -> ExtractError {
    ExtractError::Llm {
        message: format!("{what} not set. Set {var} env var."),
        status_code: None,
    }
}

/// Factory that creates provider clients from the LLM config section.
pub struct LlmClientFactory {
    config: LlmConfig,
    settings: GenerationSettings,
}

impl LlmClientFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.llm.clone(),
            settings: GenerationSettings::from_limits(&config.limits),
        }
    }
}

impl ChatModelFactory for LlmClientFactory {
    fn create(&self, model: &ModelId) -> Result<Box<dyn ChatModel>, ExtractError> {
        let name = model.api_name();
        match model.provider() {
            Provider::OpenAi => {
                let cfg = self.config.openai.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key)
                    .ok_or_else(|| missing_credential("OpenAI API key", "OPENAI_API_KEY"))?;
                Ok(Box::new(super::openai::OpenAiProvider::with_endpoint(
                    &api_key,
                    name,
                    &cfg.endpoint,
                    self.settings,
                )))
            }
            Provider::Anthropic => {
                let cfg = self.config.anthropic.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key)
                    .ok_or_else(|| missing_credential("Anthropic API key", "ANTHROPIC_API_KEY"))?;
                Ok(Box::new(super::anthropic::AnthropicProvider::new(
                    &cfg.endpoint,
                    &api_key,
                    name,
                    self.settings,
                )))
            }
            Provider::Mistral => {
                let cfg = self.config.mistral.clone().unwrap_or_default();
                let endpoint = resolve_env_var(&cfg.endpoint)
                    .unwrap_or_else(|| MistralConfig::DEFAULT_ENDPOINT.to_string());
                let api_key = resolve_env_var(&cfg.api_key)
                    .ok_or_else(|| missing_credential("Mistral API key", "MISTRAL_API_KEY"))?;
                Ok(Box::new(super::mistral::MistralProvider::new(
                    &endpoint,
                    &api_key,
                    name,
                    self.settings,
                )))
            }
            Provider::VertexAi => {
                let cfg = self.config.vertexai.clone().unwrap_or_default();
                let project = resolve_env_var(&cfg.project)
                    .ok_or_else(|| missing_credential("Vertex AI project", "GOOGLE_CLOUD_PROJECT"))?;
                let token = resolve_env_var(&cfg.access_token).ok_or_else(|| {
                    missing_credential("Vertex AI access token", "VERTEXAI_ACCESS_TOKEN")
                })?;
                Ok(Box::new(super::vertexai::VertexAiProvider::new(
                    &project,
                    &cfg.location,
                    &token,
                    name,
                    self.settings,
                )))
            }
        }
    }
}
