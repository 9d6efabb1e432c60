//! Extraction orchestrator.
//!
//! Runs one end-to-end extraction call: wait for a provider slot, render the
//! document, throttle if the provider needs it, call the model once and parse
//! its reply. Every failure propagates to the caller; nothing is retried.

use crate::config::{Config, ThrottleConfig};
use crate::error::ExtractError;
use crate::gate::ConcurrencyGate;
use crate::llm::{resolve_env_var, ChatModelFactory, LlmClientFactory};
use crate::model::ModelId;
use crate::ocr::{CachedOcr, GoogleVisionOcr};
use crate::parser::OutputParser;
use crate::prompt::build_prompt;
use crate::render::{DocumentRenderer, RenderMethod};
use crate::types::Document;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Key/value record extracted from a document.
pub type ExtractionResult = Map<String, Value>;

/// Composes renderer, client factory and concurrency gate.
#[derive(Clone)]
pub struct Extractor {
    renderer: DocumentRenderer,
    clients: Arc<dyn ChatModelFactory>,
    gate: ConcurrencyGate,
    throttle: ThrottleConfig,
    llm_timeout: Duration,
}

impl Extractor {
    pub fn new(
        renderer: DocumentRenderer,
        clients: Arc<dyn ChatModelFactory>,
        gate: ConcurrencyGate,
    ) -> Self {
        let defaults = Config::default();
        Self {
            renderer,
            clients,
            gate,
            throttle: defaults.throttle,
            llm_timeout: defaults.limits.llm_timeout(),
        }
    }

    /// Build the production stack: cached Google Vision OCR, hosted LLM
    /// clients and a gate sized from `[concurrency]`.
    pub fn from_config(config: &Config) -> Result<Self, ExtractError> {
        let api_key = resolve_env_var(&config.ocr.api_key).ok_or_else(|| ExtractError::Ocr {
            message: "Google Vision API key not set. Set GOOGLE_VISION_API_KEY env var."
                .to_string(),
        })?;
        let ocr = GoogleVisionOcr::new(&config.ocr.endpoint, &api_key, config.limits.ocr_timeout());
        let cached = CachedOcr::open(ocr, &config.ocr_cache_path())?;
        let renderer = DocumentRenderer::new(Arc::new(cached), config.render.latin_columns);

        Ok(Self::new(
            renderer,
            Arc::new(LlmClientFactory::new(config)),
            ConcurrencyGate::new(&config.concurrency),
        )
        .with_throttle(config.throttle.clone())
        .with_llm_timeout(config.limits.llm_timeout()))
    }

    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Extract structured fields from a document.
    ///
    /// The provider slot is held for the whole call, rendering included.
    pub async fn extract<P: OutputParser>(
        &self,
        model: &ModelId,
        method: RenderMethod,
        parser: &P,
        document: &Document,
    ) -> Result<ExtractionResult, ExtractError> {
        let provider = model.provider();
        let _permit = self.gate.acquire(provider).await?;

        let client = self.clients.create(model)?;
        let prompt = build_prompt(provider);

        let doc_text = self.renderer.render_document(document, method).await?;

        self.throttle(model).await;

        let vars = HashMap::from([
            ("document", doc_text),
            ("format_instructions", parser.format_instructions()),
        ]);
        let messages = prompt.render(&vars)?;

        let response = tokio::time::timeout(self.llm_timeout, client.invoke(&messages))
            .await
            .map_err(|_| ExtractError::Timeout {
                stage: "llm".to_string(),
                timeout_ms: self.llm_timeout.as_millis() as u64,
            })??;

        tracing::info!(
            provider = client.name(),
            model = %model,
            pages = document.page_count(),
            latency_ms = response.latency_ms,
            tokens = ?response.tokens_used,
            "Extraction call completed"
        );

        let output = parser.parse(&response.text)?;
        match serde_json::to_value(output) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ExtractError::Parse {
                message: format!("parser produced a non-object value: {other}"),
            }),
            Err(e) => Err(ExtractError::Parse {
                message: e.to_string(),
            }),
        }
    }

    /// Fixed pre-call delay for rate-limited providers.
    async fn throttle(&self, model: &ModelId) {
        let delay = self.throttle.delay(model.provider());
        if !delay.is_zero() {
            tracing::debug!("Throttling {} call for {delay:?}", model.provider());
            tokio::time::sleep(delay).await;
        }
    }
}
