//! Document-to-text rendering.
//!
//! Runs OCR on each page (off the async executor) and turns the recognized
//! fragments into the document text placed in the extraction prompt.

pub mod latin;

use crate::error::ExtractError;
use crate::ocr::OcrScanner;
use crate::types::{Document, PageImage, TextBox};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How OCR output is turned into prompt text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMethod {
    /// All fragments joined by single spaces
    Simple,
    /// Layout-preserving character grid
    Latin,
    /// Pluggable external formatter
    Sft,
}

impl RenderMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderMethod::Simple => "simple",
            RenderMethod::Latin => "latin",
            RenderMethod::Sft => "sft",
        }
    }
}

impl FromStr for RenderMethod {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Self::Simple),
            "latin" => Ok(Self::Latin),
            "sft" => Ok(Self::Sft),
            other => Err(ExtractError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for RenderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An external page formatter, installed at runtime for the `sft` method.
pub trait PageFormatter: Send + Sync {
    fn format(&self, boxes: &[TextBox], image: &PageImage) -> Result<String, ExtractError>;
}

/// Turns page images into prompt text.
#[derive(Clone)]
pub struct DocumentRenderer {
    ocr: Arc<dyn OcrScanner>,
    sft: Option<Arc<dyn PageFormatter>>,
    latin_columns: usize,
}

impl DocumentRenderer {
    pub fn new(ocr: Arc<dyn OcrScanner>, latin_columns: usize) -> Self {
        Self {
            ocr,
            sft: None,
            latin_columns,
        }
    }

    /// Install the formatter used by [`RenderMethod::Sft`].
    pub fn with_sft_formatter(mut self, formatter: Arc<dyn PageFormatter>) -> Self {
        self.sft = Some(formatter);
        self
    }

    /// Render a single page.
    pub async fn render(&self, image: &PageImage, method: RenderMethod) -> Result<String, ExtractError> {
        if method == RenderMethod::Sft && self.sft.is_none() {
            return Err(ExtractError::MissingDependency(
                "no sft formatter installed; register one with DocumentRenderer::with_sft_formatter"
                    .to_string(),
            ));
        }

        let boxes = self.scan(image).await?;

        match method {
            RenderMethod::Simple => Ok(boxes
                .iter()
                .map(|b| b.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")),
            RenderMethod::Latin => Ok(latin::to_prompt(&boxes, image.width(), self.latin_columns)),
            RenderMethod::Sft => match &self.sft {
                Some(formatter) => formatter.format(&boxes, image),
                None => Err(ExtractError::MissingDependency("sft formatter".to_string())),
            },
        }
    }

    /// Render a whole document.
    ///
    /// Multi-page documents get a `## Page n` header per page (1-based),
    /// rendered in input order and separated by a blank line.
    pub async fn render_document(
        &self,
        document: &Document,
        method: RenderMethod,
    ) -> Result<String, ExtractError> {
        match document {
            Document::Single(image) => self.render(image, method).await,
            Document::Pages(pages) => {
                let mut blocks = Vec::with_capacity(pages.len());
                for (idx, page) in pages.iter().enumerate() {
                    let text = self.render(page, method).await?;
                    blocks.push(format!("## Page {}\n{}\n", idx + 1, text));
                }
                Ok(blocks.join("\n"))
            }
        }
    }

    /// Run the blocking OCR scan on the blocking thread pool.
    async fn scan(&self, image: &PageImage) -> Result<Vec<TextBox>, ExtractError> {
        let ocr = self.ocr.clone();
        let image = image.clone();
        let boxes = tokio::task::spawn_blocking(move || {
            tracing::debug!(
                "Scanning {}x{} page with {}",
                image.width(),
                image.height(),
                ocr.name()
            );
            ocr.scan(&image)
        })
        .await
        .map_err(|e| ExtractError::Task(format!("OCR worker failed: {e}")))??;
        tracing::debug!("{} returned {} fragment(s)", self.ocr.name(), boxes.len());
        Ok(boxes)
    }
}
