//! OpenAI chat client using the Chat Completions API.
//!
//! Also serves OpenAI-compatible endpoints (see the Mistral client).

use super::provider::{ChatModel, ChatResponse, GenerationSettings};
use crate::error::ExtractError;
use crate::prompt::{ChatMessage, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// OpenAI provider using Chat Completions API.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
    settings: GenerationSettings,
    label: &'static str,
}

impl OpenAiProvider {
    /// Create with a custom endpoint.
    pub fn with_endpoint(
        api_key: &str,
        model: &str,
        endpoint: &str,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            settings,
            label: "OpenAI",
        }
    }

    /// Name used in error messages for OpenAI-compatible vendors.
    pub(crate) fn labelled(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    fn build_request(&self, messages: &[ChatMessage]) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            temperature: self.settings.temperature,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: match m.role {
                        Role::System => "system",
                        Role::User => "user",
                    },
                    content: m.content.clone(),
                })
                .collect(),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Option<CompletionUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct CompletionUsage {
    total_tokens: u32,
}

#[async_trait]
impl ChatModel for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, ExtractError> {
        let start = Instant::now();
        let body = self.build_request(messages);
        let label = self.label;

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| ExtractError::Llm {
                message: format!("{label} request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Llm {
                message: format!("{label} HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let chat_resp: CompletionResponse = resp.json().await.map_err(|e| ExtractError::Llm {
            message: format!("Failed to parse {label} response: {e}"),
            status_code: None,
        })?;

        let text = chat_resp
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| ExtractError::Llm {
                message: format!("{label} returned empty choices array, no content generated"),
                status_code: None,
            })?;

        Ok(ChatResponse {
            text: text.trim().to_string(),
            model: chat_resp.model,
            tokens_used: chat_resp.usage.map(|u| u.total_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;

    #[test]
    fn test_request_keeps_roles_and_temperature() {
        let provider = OpenAiProvider::with_endpoint(
            "sk",
            "gpt-4-1106-preview",
            "http://localhost/v1/chat/completions",
            GenerationSettings::from_limits(&LimitsConfig::default()),
        );
        let body = provider.build_request(&[ChatMessage {
            role: Role::System,
            content: "extract".to_string(),
        }]);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4-1106-preview");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "extract");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "model": "gpt-4o-2024-08-06",
            "choices": [{"message": {"role": "assistant", "content": " {\"total\": \"3\"} "}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let resp: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.usage.unwrap().total_tokens, 15);
        assert_eq!(
            resp.choices[0].message.content.as_deref(),
            Some(" {\"total\": \"3\"} ")
        );
    }
}
