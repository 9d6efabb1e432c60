//! docextract core - document information extraction with OCR and LLMs.
//!
//! A document (one page image or an ordered list of pages) is OCR'd, rendered
//! to text, placed in a provider-specific prompt and sent to a hosted chat
//! model. The reply is parsed into a key/value record.
//!
//! # Architecture
//!
//! ```text
//! Page images → OCR (cached) → Render (simple/latin/sft) → Prompt → LLM → Parse
//! ```
//!
//! Calls are bounded per provider by a [`ConcurrencyGate`] that is built once
//! from configuration and shared by every in-flight extraction.
//!
//! # Usage
//!
//! ```rust,ignore
//! use docextract_core::{Config, Document, Extractor, JsonOutputParser, ModelId, PageImage, RenderMethod};
//!
//! #[tokio::main]
//! async fn main() -> docextract_core::Result<()> {
//!     let config = Config::load()?;
//!     let extractor = Extractor::from_config(&config)?;
//!     let doc = Document::Single(PageImage::open("invoice.png".as_ref())?);
//!     let parser = JsonOutputParser::new(["invoice_number", "total"]);
//!     let model = ModelId::parse("gpt-4o")?;
//!
//!     let fields = extractor.extract(&model, RenderMethod::Latin, &parser, &doc).await?;
//!     println!("{fields:?}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod llm;
pub mod model;
pub mod ocr;
pub mod output;
pub mod parser;
pub mod prompt;
pub mod render;
pub mod results;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, DocextractError, ExtractError, ExtractResult, Result};
pub use extractor::{ExtractionResult, Extractor};
pub use gate::ConcurrencyGate;
pub use llm::{ChatModel, ChatModelFactory, LlmClientFactory};
pub use model::{ModelId, Provider};
pub use ocr::OcrScanner;
pub use output::{ExtractionRecord, OutputFormat, OutputWriter};
pub use parser::{JsonOutputParser, OutputParser};
pub use prompt::{build_prompt, ChatMessage, PromptSpec, Role};
pub use render::{DocumentRenderer, PageFormatter, RenderMethod};
pub use results::ResultLog;
pub use types::{Document, PageImage, TextBox};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
