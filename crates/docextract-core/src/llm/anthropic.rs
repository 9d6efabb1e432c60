//! Anthropic chat client using the Messages API.
//!
//! System-role prompt entries are sent in the top-level `system` field; the
//! API only accepts user and assistant turns in `messages`.

use super::provider::{ChatModel, ChatResponse, GenerationSettings};
use crate::error::ExtractError;
use crate::prompt::{ChatMessage, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Anthropic provider using the Messages API.
pub struct AnthropicProvider {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    settings: GenerationSettings,
}

impl AnthropicProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str, settings: GenerationSettings) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            settings,
        }
    }

    fn build_request(&self, messages: &[ChatMessage]) -> MessagesRequest {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            system: (!system.is_empty()).then(|| system.join("\n")),
            messages: messages
                .iter()
                .filter(|m| m.role == Role::User)
                .map(|m| Message {
                    role: "user",
                    content: m.content.clone(),
                })
                .collect(),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
    model: String,
    usage: Usage,
}

#[derive(Deserialize)]
struct ResponseContent {
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait]
impl ChatModel for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, ExtractError> {
        let start = Instant::now();
        let body = self.build_request(messages);

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| ExtractError::Llm {
                message: format!("Anthropic request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Llm {
                message: format!("Anthropic HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let messages_resp: MessagesResponse =
            resp.json().await.map_err(|e| ExtractError::Llm {
                message: format!("Failed to parse Anthropic response: {e}"),
                status_code: None,
            })?;

        let text = messages_resp
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ExtractError::Llm {
                message: "Anthropic returned empty response, no text content generated"
                    .to_string(),
                status_code: None,
            });
        }

        Ok(ChatResponse {
            text,
            model: messages_resp.model,
            tokens_used: Some(messages_resp.usage.input_tokens + messages_resp.usage.output_tokens),
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

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(
            "http://localhost/v1/messages",
            "sk-ant",
            "claude-3-opus-20240229",
            GenerationSettings::from_limits(&LimitsConfig::default()),
        )
    }

    #[test]
    fn test_system_entries_move_to_system_field() {
        let body = provider().build_request(&[
            ChatMessage {
                role: Role::System,
                content: "You extract.".to_string(),
            },
            ChatMessage {
                role: Role::User,
                content: "Here is the document".to_string(),
            },
        ]);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["system"], "You extract.");
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Here is the document");
    }

    #[test]
    fn test_no_system_field_without_system_entries() {
        let body = provider().build_request(&[ChatMessage {
            role: Role::User,
            content: "hi".to_string(),
        }]);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
    }
}
