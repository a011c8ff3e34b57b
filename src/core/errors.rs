//! Error types for the classification pipeline.
//!
//! This module defines the error taxonomy for a single classification call.
//! Every failure is terminal for the call that produced it; nothing is
//! retried automatically. Errors stay distinct from the "no detection"
//! outcome, which is a normal result and lives in
//! [`crate::domain::ClassifyOutcome`].

use thiserror::Error;

/// Enum representing different stages of processing in the pipeline.
///
/// Used to identify which stage of the classification pipeline an error
/// occurred in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessingStage {
    /// Error occurred during tensor operations.
    TensorOperation,
    /// Error occurred during image normalization.
    Normalization,
    /// Error occurred during image resizing.
    Resize,
    /// Error occurred during post-processing.
    PostProcessing,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::TensorOperation => write!(f, "tensor operation"),
            ProcessingStage::Normalization => write!(f, "normalization"),
            ProcessingStage::Resize => write!(f, "resize"),
            ProcessingStage::PostProcessing => write!(f, "post-processing"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Errors that can occur while classifying an image.
///
/// Covers image loading, pixel-buffer preparation, model loading, inference,
/// and the execution engine's admission and deadline policies.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// Error occurred while loading or decoding an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// The pixel buffer for an image could not be allocated.
    #[error("pixel buffer allocation failed for {width}x{height} image: {context}")]
    BufferAllocation {
        /// Width of the source image.
        width: u32,
        /// Height of the source image.
        height: u32,
        /// Additional context about the failure.
        context: String,
    },

    /// The model artifact could not be loaded.
    #[error("model load failed for '{model_path}': {reason}{suggestion}")]
    ModelLoad {
        /// Path to the model file.
        model_path: String,
        /// Short reason description.
        reason: String,
        /// Optional suggestion, prefixed when present.
        suggestion: String,
        /// The underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The inference runner reported an error.
    #[error("inference failed for model '{model_name}': {context}")]
    Inference {
        /// Name of the model that failed.
        model_name: String,
        /// Additional context about the error.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred during a processing stage.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// A classification call was rejected because one is already in flight.
    #[error("classification already in flight; overlapping calls are rejected")]
    Busy,

    /// The engine deadline elapsed before the inference runner returned.
    ///
    /// The submitted inference is not cancelled; it runs to completion in the
    /// background and keeps the single-flight slot occupied until then.
    #[error("classification timed out after {waited_ms} ms")]
    Timeout {
        /// How long the caller waited before giving up.
        waited_ms: u64,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor shape operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for classification operations.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

impl ClassifyError {
    /// Creates a ClassifyError for a failed pixel buffer allocation.
    pub fn buffer_allocation(width: u32, height: u32, context: impl Into<String>) -> Self {
        Self::BufferAllocation {
            width,
            height,
            context: context.into(),
        }
    }

    /// Creates a ClassifyError for model load failures with contextual
    /// suggestions.
    ///
    /// # Arguments
    /// * `model_path` - Path to the model file
    /// * `reason` - Short reason description
    /// * `suggestion` - Optional suggestion message (without punctuation)
    /// * `source` - Optional underlying error
    pub fn model_load_error(
        model_path: impl AsRef<std::path::Path>,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        let suggestion = suggestion
            .map(|s| format!("; suggested fix: {}", s))
            .unwrap_or_default();
        Self::ModelLoad {
            model_path: model_path.as_ref().display().to_string(),
            reason: reason.into(),
            suggestion,
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates a ClassifyError for inference operations with model context.
    pub fn inference_error(
        model_name: &str,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.to_string(),
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a ClassifyError for processing operations.
    pub fn processing_error(
        kind: ProcessingStage,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a ClassifyError for post-processing operations.
    pub fn post_processing(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::processing_error(ProcessingStage::PostProcessing, context, error)
    }

    /// Creates a ClassifyError for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a ClassifyError for configuration errors.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for ClassifyError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl From<crate::core::config::ConfigError> for ClassifyError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

/// A minimal string-backed error for wrapping plain messages as error
/// sources.
#[derive(Debug)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new SimpleError with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SimpleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_allocation_display() {
        let err = ClassifyError::buffer_allocation(0, 480, "zero width");
        let message = err.to_string();
        assert!(message.contains("0x480"));
        assert!(message.contains("zero width"));
    }

    #[test]
    fn test_model_load_error_with_suggestion() {
        let err = ClassifyError::model_load_error(
            "models/missing.onnx",
            "file not found",
            Some("verify the model path"),
            None::<std::io::Error>,
        );
        let message = err.to_string();
        assert!(message.contains("models/missing.onnx"));
        assert!(message.contains("suggested fix"));
    }

    #[test]
    fn test_processing_stage_display() {
        assert_eq!(ProcessingStage::Normalization.to_string(), "normalization");
        assert_eq!(ProcessingStage::Resize.to_string(), "resize");
    }
}
