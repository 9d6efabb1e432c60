//! Model identifiers and provider resolution.
//!
//! A model string such as `"claude-3-opus-20240229"` is resolved once into a
//! [`ModelId`] that carries its [`Provider`] and the concrete model name sent
//! to the provider API.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hosted LLM vendor behind a model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    VertexAi,
    Mistral,
    Anthropic,
}

impl Provider {
    /// All providers, in prefix-matching order.
    pub const ALL: [Provider; 4] = [
        Provider::OpenAi,
        Provider::VertexAi,
        Provider::Mistral,
        Provider::Anthropic,
    ];

    /// Model-name prefix that selects this provider.
    pub fn prefix(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt",
            Provider::VertexAi => "gemini",
            Provider::Mistral => "mistral",
            Provider::Anthropic => "claude",
        }
    }

    /// Resolve the provider for a model identifier by prefix.
    pub fn resolve(model: &str) -> Result<Self, ExtractError> {
        Self::ALL
            .into_iter()
            .find(|p| model.starts_with(p.prefix()))
            .ok_or_else(|| ExtractError::UnknownProvider(model.to_string()))
    }

    /// Stable lowercase name used in config keys and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::VertexAi => "vertexai",
            Provider::Mistral => "mistral",
            Provider::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated model identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId {
    name: String,
    api_name: String,
    provider: Provider,
}

impl ModelId {
    /// Validate a model identifier and resolve its provider.
    pub fn parse(name: &str) -> Result<Self, ExtractError> {
        let provider = Provider::resolve(name)?;
        Ok(Self {
            name: name.to_string(),
            api_name: normalize_alias(name).to_string(),
            provider,
        })
    }

    /// The identifier exactly as supplied.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The concrete model version sent to the provider.
    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }
}

impl FromStr for ModelId {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Map legacy shorthand names to dated model versions.
fn normalize_alias(name: &str) -> &str {
    match name {
        "gpt-4-turbo" => "gpt-4-1106-preview",
        "claude-3" => "claude-3-opus-20240229",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_prefixes() {
        assert_eq!(Provider::resolve("gpt-4o").unwrap(), Provider::OpenAi);
        assert_eq!(Provider::resolve("gemini-pro").unwrap(), Provider::VertexAi);
        assert_eq!(
            Provider::resolve("mistral-large-latest").unwrap(),
            Provider::Mistral
        );
        assert_eq!(Provider::resolve("claude-3").unwrap(), Provider::Anthropic);
    }

    #[test]
    fn test_resolve_unknown_prefix() {
        let err = Provider::resolve("llama-3-70b").unwrap_err();
        assert!(matches!(err, ExtractError::UnknownProvider(ref m) if m == "llama-3-70b"));
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        assert!(Provider::resolve("GPT-4").is_err());
    }

    #[test]
    fn test_model_id_normalizes_legacy_aliases() {
        let gpt = ModelId::parse("gpt-4-turbo").unwrap();
        assert_eq!(gpt.name(), "gpt-4-turbo");
        assert_eq!(gpt.api_name(), "gpt-4-1106-preview");

        let claude: ModelId = "claude-3".parse().unwrap();
        assert_eq!(claude.api_name(), "claude-3-opus-20240229");
        assert_eq!(claude.provider(), Provider::Anthropic);
    }

    #[test]
    fn test_model_id_keeps_dated_names() {
        let model = ModelId::parse("gemini-1.0-pro-002").unwrap();
        assert_eq!(model.api_name(), "gemini-1.0-pro-002");
        assert_eq!(model.to_string(), "gemini-1.0-pro-002");
    }

    #[test]
    fn test_provider_serde_names() {
        assert_eq!(
            serde_json::to_string(&Provider::VertexAi).unwrap(),
            "\"vertexai\""
        );
        assert_eq!(Provider::OpenAi.to_string(), "openai");
    }
}
