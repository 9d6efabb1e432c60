//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::model::Provider;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for provider in Provider::ALL {
            if self.concurrency.permits(provider) == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "concurrency.{provider} must be > 0"
                )));
            }
        }
        if self.limits.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.ocr_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.ocr_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_tokens must be > 0".into(),
            ));
        }
        if self.render.latin_columns == 0 {
            return Err(ConfigError::ValidationError(
                "render.latin_columns must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_permits() {
        let mut config = Config::default();
        config.concurrency.anthropic = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("concurrency.anthropic"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.llm_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("llm_timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_zero_max_tokens() {
        let mut config = Config::default();
        config.limits.max_tokens = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_tokens"));
    }

    #[test]
    fn test_validate_rejects_zero_columns() {
        let mut config = Config::default();
        config.render.latin_columns = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("latin_columns"));
    }
}
