//! Core building blocks of the classification pipeline.
//!
//! This module contains the fundamental components shared across the crate:
//! - Error handling
//! - Configuration management
//! - Tensor type aliases
//! - Inference engine integration
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod config;
pub mod errors;
pub mod inference;
pub mod tensor;

pub use config::{ConfigError, ModelConfig, OrtSessionConfig};
pub use errors::{ClassifyError, ClassifyResult, ProcessingStage};
pub use inference::OrtInfer;
pub use tensor::{Tensor2D, Tensor4D};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and
/// formatting layer. It's typically called at the start of an application to
/// enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
