//! ONNX-backed image classifier.
//!
//! Pipeline for one call: validate dimensions, resize to the model's input
//! shape, normalize into a pixel buffer, run one forward pass, then select
//! the top-ranked class. The model handle is owned by the classifier and
//! loaded exactly once when the classifier is built.

use crate::classifier::Classifier;
use crate::core::config::ModelConfig;
use crate::core::{ClassifyError, OrtInfer, OrtSessionConfig};
use crate::domain::{oxford_flower_labels, Classification, ClassifyOutcome};
use crate::processors::{resize_to_input, softmax, NormalizeImage, Topk};
use crate::utils::labels_from_file;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Configuration for the image classifier.
///
/// Serializable so callers can keep classifier settings in a JSON file, the
/// same way the model-level settings in [`ModelConfig`] round-trip.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ImageClassifierConfig {
    /// Common model configuration.
    pub model: ModelConfig,
    /// Input shape for the model (width, height).
    pub input_shape: Option<(u32, u32)>,
    /// Whether to apply softmax to the model's raw scores.
    pub apply_softmax: Option<bool>,
}

impl ImageClassifierConfig {
    /// Creates a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ClassifyError> {
        self.model.validate()?;

        if let Some((width, height)) = self.input_shape {
            if width == 0 || height == 0 {
                return Err(ClassifyError::config_error(format!(
                    "input_shape must be positive, got {}x{}",
                    width, height
                )));
            }
        }

        Ok(())
    }
}

/// Classifies a photo against a pre-trained model and returns the top-1
/// class label with its confidence.
///
/// The classifier is immutable after construction and safe to share across
/// threads; the underlying session pool allows concurrent read-only
/// inference.
#[derive(Debug)]
pub struct ImageClassifier {
    /// Name of the model being used.
    model_name: String,
    /// Input shape for the model (width, height).
    input_shape: (u32, u32),
    /// Resampling filter used when resizing to the input shape.
    resize_filter: FilterType,
    /// Image normalizer producing the model's pixel buffer.
    normalize: NormalizeImage,
    /// ONNX Runtime inference engine.
    infer: OrtInfer,
    /// Top-k operator mapping class ids to labels.
    post_op: Topk,
    /// Whether raw scores are passed through softmax.
    apply_softmax: bool,
}

impl ImageClassifier {
    /// Returns the name of the loaded model.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the model's expected input shape (width, height).
    pub fn input_shape(&self) -> (u32, u32) {
        self.input_shape
    }

    /// Loads an image from a path and classifies it.
    pub fn classify_path(&self, path: &Path) -> Result<ClassifyOutcome, ClassifyError> {
        let image = crate::utils::load_image(path)?;
        self.classify(&image)
    }

    /// Selects the top-1 entry from a score vector.
    fn select_top1(&self, scores: &[f32]) -> Result<ClassifyOutcome, ClassifyError> {
        let scores = if self.apply_softmax {
            softmax(scores)
        } else {
            scores.to_vec()
        };

        let top = self.post_op.process_single(&scores, 1).map_err(|e| {
            ClassifyError::post_processing(
                "top-1 selection failed",
                crate::core::errors::SimpleError::new(e),
            )
        })?;

        match (top.indexes.first(), top.scores.first()) {
            (Some(&class_id), Some(&confidence)) => {
                let label = top
                    .class_names
                    .as_ref()
                    .and_then(|names| names.first().cloned())
                    .unwrap_or_else(|| format!("class_{}", class_id));
                Ok(ClassifyOutcome::Detected(Classification::new(
                    class_id, label, confidence,
                )))
            }
            _ => Ok(ClassifyOutcome::NoDetection),
        }
    }
}

impl Classifier for ImageClassifier {
    /// Classifies one decoded image.
    ///
    /// The result is deterministic: the same image with the same loaded
    /// model yields an identical label and confidence.
    ///
    /// # Errors
    ///
    /// * [`ClassifyError::InvalidInput`] for zero-sized images
    /// * [`ClassifyError::BufferAllocation`] when the pixel buffer cannot be
    ///   built
    /// * [`ClassifyError::Inference`] when the runtime rejects the request
    fn classify(&self, image: &RgbImage) -> Result<ClassifyOutcome, ClassifyError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ClassifyError::invalid_input(format!(
                "image must have positive dimensions, got {}x{}",
                width, height
            )));
        }

        let resized = resize_to_input(image, self.input_shape, self.resize_filter);
        let buffer = self.normalize.normalize_to(DynamicImage::ImageRgb8(resized))?;
        let predictions = self.infer.infer_2d(&buffer)?;

        let row: Vec<f32> = match predictions.outer_iter().next() {
            Some(row) => row.to_vec(),
            None => {
                tracing::debug!(model = %self.model_name, "model produced no output rows");
                return Ok(ClassifyOutcome::NoDetection);
            }
        };

        if row.is_empty() {
            tracing::debug!(model = %self.model_name, "model produced an empty distribution");
            return Ok(ClassifyOutcome::NoDetection);
        }

        let outcome = self.select_top1(&row)?;
        if let ClassifyOutcome::Detected(result) = &outcome {
            tracing::debug!(
                model = %self.model_name,
                label = %result.label,
                confidence = result.confidence,
                "classified image"
            );
        }
        Ok(outcome)
    }
}

/// Builder for the image classifier.
///
/// Defaults target the bundled Oxford-102 flower model: 224x224 input,
/// ImageNet normalization, Lanczos3 resampling, softmax on, and the flower
/// label table.
pub struct ImageClassifierBuilder {
    model: ModelConfig,
    input_shape: Option<(u32, u32)>,
    resize_filter: FilterType,
    labels: Option<Vec<String>>,
    apply_softmax: Option<bool>,
}

impl ImageClassifierBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            model: ModelConfig::new(),
            input_shape: None,
            resize_filter: FilterType::Lanczos3,
            labels: None,
            apply_softmax: None,
        }
    }

    /// Creates a builder from a previously saved configuration.
    pub fn from_config(config: ImageClassifierConfig) -> Self {
        Self {
            model: config.model,
            input_shape: config.input_shape,
            resize_filter: FilterType::Lanczos3,
            labels: None,
            apply_softmax: config.apply_softmax,
        }
    }

    /// Sets the model display name.
    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.model = self.model.model_name(name);
        self
    }

    /// Sets the session pool size for concurrent predictions.
    pub fn session_pool_size(mut self, size: usize) -> Self {
        self.model = self.model.session_pool_size(size);
        self
    }

    /// Sets the ONNX Runtime session configuration.
    pub fn ort_session(mut self, config: OrtSessionConfig) -> Self {
        self.model = self.model.ort_session(config);
        self
    }

    /// Sets the input image shape (width, height).
    pub fn input_shape(mut self, shape: (u32, u32)) -> Self {
        self.input_shape = Some(shape);
        self
    }

    /// Sets the resampling filter used to reach the input shape.
    pub fn resize_filter(mut self, filter: FilterType) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Sets the class label table (index = class ID).
    pub fn labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Loads the class label table from a file with one label per line.
    pub fn labels_file(mut self, path: &Path) -> Result<Self, ClassifyError> {
        self.labels = Some(labels_from_file(path)?);
        Ok(self)
    }

    /// Enables or disables the softmax stage.
    pub fn apply_softmax(mut self, enabled: bool) -> Self {
        self.apply_softmax = Some(enabled);
        self
    }

    /// Builds the classifier, loading the model artifact at `model_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::ModelLoad`] when the artifact is missing or
    /// corrupt, and [`ClassifyError::ConfigError`] when the configuration is
    /// invalid.
    pub fn build(mut self, model_path: &Path) -> Result<ImageClassifier, ClassifyError> {
        if self.model.model_path.is_none() {
            self.model = self.model.model_path(model_path.to_path_buf());
        }

        let config = ImageClassifierConfig {
            model: self.model,
            input_shape: self.input_shape,
            apply_softmax: self.apply_softmax,
        };
        config.validate()?;

        let input_shape = config.input_shape.unwrap_or((224, 224));
        let labels = match self.labels {
            Some(labels) if labels.is_empty() => {
                return Err(ClassifyError::config_error("label table must not be empty"));
            }
            Some(labels) => labels,
            None => oxford_flower_labels(),
        };

        let infer = OrtInfer::from_config(&config.model, model_path, None)?;
        let model_name = infer.model_name().to_string();

        // NCHW declared shapes use -1 for dynamic dimensions; only compare
        // the static case.
        if let Some(declared) = infer.primary_input_shape() {
            if declared.len() == 4 {
                let (height, width) = (declared[2], declared[3]);
                if height > 0
                    && width > 0
                    && (width as u32, height as u32) != input_shape
                {
                    tracing::warn!(
                        model = %model_name,
                        declared = ?declared,
                        configured = ?input_shape,
                        "model declares a different input shape than configured"
                    );
                }
            }
        }

        Ok(ImageClassifier {
            model_name,
            input_shape,
            resize_filter: self.resize_filter,
            normalize: NormalizeImage::imagenet()?,
            infer,
            post_op: Topk::from_class_names(labels),
            apply_softmax: config.apply_softmax.unwrap_or(true),
        })
    }
}

impl Default for ImageClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_missing_model_fails_with_model_load() {
        let result = ImageClassifierBuilder::new().build(Path::new("missing_model.onnx"));
        assert!(matches!(result, Err(ClassifyError::ModelLoad { .. })));
    }

    #[test]
    fn test_build_rejects_zero_input_shape() {
        let result = ImageClassifierBuilder::new()
            .input_shape((0, 224))
            .build(Path::new("missing_model.onnx"));
        assert!(matches!(result, Err(ClassifyError::ConfigError { .. })));
    }

    #[test]
    fn test_build_rejects_empty_label_table() {
        let result = ImageClassifierBuilder::new()
            .labels(vec![])
            .build(Path::new("missing_model.onnx"));
        assert!(matches!(result, Err(ClassifyError::ConfigError { .. })));
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = ImageClassifierConfig {
            model: ModelConfig::new().model_name("oxford102"),
            input_shape: Some((224, 224)),
            apply_softmax: Some(true),
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ImageClassifierConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.input_shape, Some((224, 224)));
        assert_eq!(parsed.model.model_name.as_deref(), Some("oxford102"));
    }
}
