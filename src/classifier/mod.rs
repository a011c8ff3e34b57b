//! The classifier adapter: one image in, one top-1 outcome out.
//!
//! * `image_classifier` - ONNX-backed classifier, its configuration, and
//!   builder
//! * `engine` - Async execution with single-flight admission and an optional
//!   deadline

pub mod engine;
pub mod image_classifier;

pub use engine::ClassifyEngine;
pub use image_classifier::{ImageClassifier, ImageClassifierBuilder, ImageClassifierConfig};

use crate::core::ClassifyError;
use crate::domain::ClassifyOutcome;
use image::RgbImage;

/// A synchronous single-image classifier.
///
/// The seam between the pipeline and its callers: production code uses
/// [`ImageClassifier`], tests inject mocks, and [`ClassifyEngine`] accepts
/// any implementation.
pub trait Classifier {
    /// Classifies one decoded image, returning the top-1 outcome.
    fn classify(&self, image: &RgbImage) -> Result<ClassifyOutcome, ClassifyError>;
}
