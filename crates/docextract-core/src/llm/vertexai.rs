//! Vertex AI (Gemini) chat client using `generateContent`.
//!
//! Consecutive prompt entries with the same role are merged into one content
//! turn, since Gemini expects alternating roles.

use super::provider::{ChatModel, ChatResponse, GenerationSettings};
use crate::error::ExtractError;
use crate::prompt::{ChatMessage, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Vertex AI provider for Gemini models.
pub struct VertexAiProvider {
    url: String,
    access_token: String,
    model: String,
    client: reqwest::Client,
    settings: GenerationSettings,
}

impl VertexAiProvider {
    pub fn new(
        project: &str,
        location: &str,
        access_token: &str,
        model: &str,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            url: generate_url(project, location, model),
            access_token: access_token.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            settings,
        }
    }

    fn build_request(&self, messages: &[ChatMessage]) -> GenerateRequest {
        let system: Vec<Part> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| Part {
                text: m.content.clone(),
            })
            .collect();

        let mut contents: Vec<Content> = Vec::new();
        for m in messages.iter().filter(|m| m.role == Role::User) {
            match contents.last_mut() {
                Some(last) if last.role == "user" => last.parts.push(Part {
                    text: m.content.clone(),
                }),
                _ => contents.push(Content {
                    role: "user",
                    parts: vec![Part {
                        text: m.content.clone(),
                    }],
                }),
            }
        }

        GenerateRequest {
            contents,
            system_instruction: (!system.is_empty()).then_some(SystemInstruction { parts: system }),
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                max_output_tokens: self.settings.max_tokens,
            },
        }
    }
}

fn generate_url(project: &str, location: &str, model: &str) -> String {
    format!(
        "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent"
    )
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

#[async_trait]
impl ChatModel for VertexAiProvider {
    fn name(&self) -> &str {
        "vertexai"
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, ExtractError> {
        let start = Instant::now();
        let body = self.build_request(messages);

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| ExtractError::Llm {
                message: format!("Vertex AI request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Llm {
                message: format!("Vertex AI HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let gen_resp: GenerateResponse = resp.json().await.map_err(|e| ExtractError::Llm {
            message: format!("Failed to parse Vertex AI response: {e}"),
            status_code: None,
        })?;

        let text = gen_resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExtractError::Llm {
                message: "Vertex AI returned no candidates, no content generated".to_string(),
                status_code: None,
            })?;

        Ok(ChatResponse {
            text,
            model: gen_resp.model_version.unwrap_or_else(|| self.model.clone()),
            tokens_used: gen_resp.usage_metadata.and_then(|u| u.total_token_count),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}
