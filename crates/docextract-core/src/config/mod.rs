//! Configuration management for docextract.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Per-provider concurrency limits
    pub concurrency: ConcurrencyConfig,

    /// Per-provider pre-call delays
    pub throttle: ThrottleConfig,

    /// Rendering settings
    pub render: RenderConfig,

    /// OCR service settings
    pub ocr: OcrConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// LLM provider settings
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.docextract.docextract/config.toml
    /// - Linux: ~/.config/docextract/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\docextract\config\config.toml
    ///
    /// Falls back to ~/.docextract/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "docextract", "docextract")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".docextract").join("config.toml")
            })
    }

    /// Resolved OCR cache path (with ~ expansion).
    pub fn ocr_cache_path(&self) -> PathBuf {
        expand(&self.general.ocr_cache)
    }

    /// Resolved results log path (with ~ expansion).
    pub fn results_log_path(&self) -> PathBuf {
        expand(&self.general.results_log)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Provider;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.concurrency.permits(Provider::Anthropic), 1);
        assert_eq!(config.concurrency.permits(Provider::OpenAi), 5);
        assert_eq!(config.limits.max_tokens, 4096);
        assert_eq!(config.general.results_log, PathBuf::from("results.txt"));
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[concurrency]"));
        assert!(toml.contains("[throttle]"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[concurrency]\nanthropic = 2\n\n[llm.mistral]\nendpoint = \"http://localhost:8080/v1\"\napi_key = \"k\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.concurrency.anthropic, 2);
        assert_eq!(config.concurrency.openai, 5);
        assert_eq!(
            config.llm.mistral.unwrap().endpoint,
            "http://localhost:8080/v1"
        );
        assert!(config.llm.openai.is_none());
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[concurrency]\nopenai = 0\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("concurrency.openai"));
    }

    #[test]
    fn test_throttle_defaults() {
        let config = Config::default();
        assert_eq!(
            config.throttle.delay(Provider::Anthropic),
            std::time::Duration::from_secs(10)
        );
        assert!(config.throttle.delay(Provider::VertexAi).is_zero());
    }
}
