//! # flora-id
//!
//! A Rust library that classifies flower photos using a pre-trained ONNX
//! model and returns the top-1 class label with its confidence.
//!
//! ## Features
//!
//! - Single-shot classification pipeline: resize, normalize, infer, select
//! - Explicit model handle loaded once at construction, never mutated
//! - Tagged outcome type that keeps "no detection" distinct from errors
//! - Async execution engine with single-flight semantics and an optional
//!   deadline
//! - ONNX Runtime integration with configurable sessions and session pooling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flora_id::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let classifier = ImageClassifierBuilder::new()
//!     .input_shape((224, 224))
//!     .build(Path::new("models/oxford102.onnx"))?;
//!
//! let image = load_image(Path::new("photos/daffodil.jpg"))?;
//! match classifier.classify(&image)? {
//!     ClassifyOutcome::Detected(result) => println!("{result}"),
//!     ClassifyOutcome::NoDetection => println!("Unknown"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Async engine
//!
//! ```rust,no_run
//! use flora_id::prelude::*;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let classifier = ImageClassifierBuilder::new()
//!     .build(Path::new("models/oxford102.onnx"))?;
//! let engine = ClassifyEngine::new(classifier).with_timeout(Duration::from_secs(5));
//!
//! let image = load_image(Path::new("photos/daffodil.jpg"))?;
//! let outcome = engine.classify(image).await?;
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod core;
pub mod domain;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use flora_id::prelude::*;
/// ```
pub mod prelude {
    pub use crate::classifier::{
        ClassifyEngine, Classifier, ImageClassifier, ImageClassifierBuilder,
    };
    pub use crate::core::{ClassifyError, ClassifyResult};
    pub use crate::domain::{Classification, ClassifyOutcome};
    pub use crate::utils::load_image;
}
