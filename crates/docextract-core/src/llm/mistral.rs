//! Mistral chat client (OpenAI-compatible API).
//!
//! Mistral uses the same Chat Completions format as OpenAI, so this
//! delegates to `OpenAiProvider` with the configured endpoint.

use super::openai::OpenAiProvider;
use super::provider::{ChatModel, ChatResponse, GenerationSettings};
use crate::error::ExtractError;
use crate::prompt::ChatMessage;
use async_trait::async_trait;
use std::time::Duration;

/// Mistral provider wrapping an OpenAI-compatible endpoint.
pub struct MistralProvider {
    inner: OpenAiProvider,
}

impl MistralProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str, settings: GenerationSettings) -> Self {
        Self {
            inner: OpenAiProvider::with_endpoint(
                api_key,
                model,
                &chat_url(endpoint),
                settings,
            )
            .labelled("Mistral"),
        }
    }
}

fn chat_url(endpoint: &str) -> String {
    format!("{}/chat/completions", endpoint.trim_end_matches('/'))
}

#[async_trait]
impl ChatModel for MistralProvider {
    fn name(&self) -> &str {
        "mistral"
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, ExtractError> {
        self.inner.invoke(messages).await
    }

    fn timeout(&self) -> Duration {
        self.inner.timeout()
    }
}
