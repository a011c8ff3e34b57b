//! Configuration management for the classification pipeline.
//!
//! Provides the model-level configuration shared by classifier builders and
//! the ONNX Runtime session configuration applied at model load time.

pub mod onnx;

pub use onnx::{OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration field holds an invalid value.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Common model configuration shared by classifier builders.
///
/// Holds everything needed to bind a model artifact to an inference session:
/// the artifact path, a display name, the session pool size for concurrent
/// read-only inference, and the optional ONNX Runtime session settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the model artifact.
    pub model_path: Option<PathBuf>,
    /// Human-readable model name used in logs and errors.
    pub model_name: Option<String>,
    /// Number of pooled sessions (minimum 1).
    pub session_pool_size: Option<usize>,
    /// ONNX Runtime session configuration.
    pub ort_session: Option<OrtSessionConfig>,
}

impl ModelConfig {
    /// Creates a new, empty model configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model artifact path.
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Sets the model display name.
    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }

    /// Sets the session pool size.
    pub fn session_pool_size(mut self, size: usize) -> Self {
        self.session_pool_size = Some(size);
        self
    }

    /// Sets the ONNX Runtime session configuration.
    pub fn ort_session(mut self, config: OrtSessionConfig) -> Self {
        self.ort_session = Some(config);
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the session pool size is zero or the model path is
    /// set but empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(size) = self.session_pool_size {
            if size == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "session_pool_size".to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        if let Some(path) = &self.model_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "model_path".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ModelConfig::new().validate().is_ok());
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let config = ModelConfig::new().session_pool_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_model_path_rejected() {
        let config = ModelConfig::new().model_path("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = ModelConfig::new()
            .model_path("models/oxford102.onnx")
            .model_name("oxford102")
            .session_pool_size(2);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ModelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.model_name.as_deref(), Some("oxford102"));
        assert_eq!(parsed.session_pool_size, Some(2));
    }
}
