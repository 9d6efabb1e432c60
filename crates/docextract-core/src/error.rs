//! Error types for document information extraction.
//!
//! Errors are organized by concern so that a failed extraction call reports
//! which stage broke (OCR, prompt, provider call, parsing) with the relevant
//! context attached.

use thiserror::Error;

/// Top-level error type for docextract operations.
#[derive(Error, Debug)]
pub enum DocextractError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Extraction errors
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while running a single extraction call.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The model identifier has no known provider prefix
    #[error("Unknown model: {0}")]
    UnknownProvider(String),

    /// The rendering method name is not supported
    #[error("Unknown prompting method: {0}")]
    UnknownMethod(String),

    /// An optional formatter was requested but none is installed
    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    /// OCR scan or OCR cache failure
    #[error("OCR error: {message}")]
    Ocr { message: String },

    /// Page image could not be read or decoded
    #[error("Image error: {message}")]
    Image { message: String },

    /// Prompt template could not be rendered
    #[error("Prompt error: {message}")]
    Prompt { message: String },

    /// LLM provider call failed
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        status_code: Option<u16>,
    },

    /// The LLM reply could not be parsed into a structured record
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// A blocking worker task failed to complete
    #[error("Worker task failed: {0}")]
    Task(String),
}

/// Convenience type alias for docextract results.
pub type Result<T> = std::result::Result<T, DocextractError>;

/// Convenience type alias for extraction-specific results.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_message() {
        let err = ExtractError::Llm {
            message: "Anthropic HTTP 529: overloaded".to_string(),
            status_code: Some(529),
        };
        assert_eq!(err.to_string(), "LLM error: Anthropic HTTP 529: overloaded");
    }

    #[test]
    fn test_extract_error_converts_to_top_level() {
        let err: DocextractError = ExtractError::UnknownMethod("xyz".to_string()).into();
        assert!(err.to_string().contains("Unknown prompting method: xyz"));
    }
}
