//! ONNX Runtime inference engine with configurable, pooled sessions.
//!
//! The engine is the explicit model handle of the pipeline: it is constructed
//! once, holds the loaded sessions for the lifetime of the process, and is
//! never mutated after load. Sessions are pooled behind mutexes and picked
//! round-robin, so concurrent read-only inference calls do not serialize on a
//! single session.

use crate::core::config::{
    ModelConfig, OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig,
};
use crate::core::errors::{ClassifyError, SimpleError};
use crate::core::tensor::{Tensor2D, Tensor4D};
use ndarray::ArrayView2;
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, CoreMLExecutionProvider,
    DirectMLExecutionProvider, ExecutionProviderDispatch,
};
use ort::logging::LogLevel;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::value::{TensorRef, ValueType};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct OrtInfer {
    sessions: Vec<Mutex<Session>>,
    next_idx: AtomicUsize,
    input_name: String,
    model_path: std::path::PathBuf,
    model_name: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("sessions", &self.sessions.len())
            .field("input_name", &self.input_name)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Creates a new OrtInfer instance with default ONNX Runtime settings and
    /// a single session.
    ///
    /// The input tensor name is discovered from the session when not given.
    pub fn new(model_path: impl AsRef<Path>, input_name: Option<&str>) -> Result<Self, ClassifyError> {
        Self::from_config(&ModelConfig::new(), model_path, input_name)
    }

    /// Creates a new OrtInfer instance from a [`ModelConfig`], applying ORT
    /// session configuration and constructing a session pool for concurrent
    /// predictions.
    pub fn from_config(
        config: &ModelConfig,
        model_path: impl AsRef<Path>,
        input_name: Option<&str>,
    ) -> Result<Self, ClassifyError> {
        let path = model_path.as_ref();
        let pool_size = config.session_pool_size.unwrap_or(1).max(1);

        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let builder = Session::builder()?;
            let builder = if let Some(cfg) = &config.ort_session {
                apply_ort_config(builder, cfg)?
            } else {
                // Default log level Error suppresses ORT chatter.
                builder.with_log_level(LogLevel::Error)?
            };
            let session = builder.commit_from_file(path).map_err(|e| {
                ClassifyError::model_load_error(
                    path,
                    "failed to create ONNX session",
                    Some("verify the model path and execution provider configuration"),
                    Some(e),
                )
            })?;
            sessions.push(Mutex::new(session));
        }

        let input_name = match input_name {
            Some(name) => name.to_string(),
            None => discover_input_name(&sessions[0])?,
        };

        let model_name = config
            .model_name
            .clone()
            .or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| "unknown_model".to_string());

        tracing::debug!(
            model = %model_name,
            path = %path.display(),
            pool = pool_size,
            input = %input_name,
            "ONNX session pool ready"
        );

        Ok(OrtInfer {
            sessions,
            next_idx: AtomicUsize::new(0),
            input_name,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    /// Returns the model path associated with this inference engine.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the model name associated with this inference engine.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Attempts to retrieve the primary input tensor shape from the first
    /// session.
    ///
    /// Returns a vector of dimensions if available. Dynamic dimensions
    /// (e.g., -1) are returned as-is.
    pub fn primary_input_shape(&self) -> Option<Vec<i64>> {
        let session_mutex = self.sessions.first()?;
        let session_guard = session_mutex.lock().ok()?;
        let input = session_guard.inputs.first()?;
        match &input.input_type {
            ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect()),
            _ => None,
        }
    }

    /// Returns the discovered output tensor name.
    fn get_output_name(&self) -> Result<String, ClassifyError> {
        let session = self.sessions[0]
            .lock()
            .map_err(|_| ClassifyError::InvalidInput {
                message: "Failed to acquire session lock".to_string(),
            })?;
        if let Some(output) = session.outputs.first() {
            Ok(output.name.clone())
        } else {
            Err(ClassifyError::InvalidInput {
                message: "No outputs available in session - model may be invalid or corrupted"
                    .to_string(),
            })
        }
    }

    /// Runs one forward pass and returns a 2D output tensor
    /// (batch_size x num_classes).
    pub fn infer_2d(&self, x: &Tensor4D) -> Result<Tensor2D, ClassifyError> {
        let batch_size = x.shape()[0];
        let input_shape = x.shape().to_vec();

        let output_name = self.get_output_name().map_err(|e| {
            ClassifyError::inference_error(
                &self.model_name,
                &format!(
                    "failed to get output name for model at '{}'",
                    self.model_path.display()
                ),
                e,
            )
        })?;

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            ClassifyError::inference_error(
                &self.model_name,
                &format!("failed to convert input tensor with shape {:?}", input_shape),
                e,
            )
        })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let idx = self.next_idx.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session_guard = self.sessions[idx].lock().map_err(|_| {
            ClassifyError::inference_error(
                &self.model_name,
                &format!(
                    "failed to acquire session lock for session {}/{}",
                    idx,
                    self.sessions.len()
                ),
                SimpleError::new("session lock acquisition failed"),
            )
        })?;

        let outputs = session_guard.run(inputs).map_err(|e| {
            ClassifyError::inference_error(
                &self.model_name,
                &format!(
                    "forward pass failed with input '{}' -> output '{}'",
                    self.input_name, output_name
                ),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                ClassifyError::inference_error(
                    &self.model_name,
                    &format!("failed to extract output tensor '{}' as f32", output_name),
                    e,
                )
            })?;

        if output_shape.len() != 2 {
            return Err(ClassifyError::inference_error(
                &self.model_name,
                &format!(
                    "expected 2D output tensor, got {}D with shape {:?}",
                    output_shape.len(),
                    output_shape
                ),
                SimpleError::new("invalid output tensor dimensions"),
            ));
        }

        let num_classes = output_shape[1] as usize;
        let expected_len = batch_size * num_classes;
        if output_data.len() != expected_len {
            return Err(ClassifyError::inference_error(
                &self.model_name,
                &format!(
                    "output data size mismatch: expected {}, got {}",
                    expected_len,
                    output_data.len()
                ),
                SimpleError::new("output tensor data size mismatch"),
            ));
        }

        let array_view = ArrayView2::from_shape((batch_size, num_classes), output_data)
            .map_err(ClassifyError::Tensor)?;
        Ok(array_view.to_owned())
    }
}

/// Discovers the name of the first declared input tensor.
fn discover_input_name(session: &Mutex<Session>) -> Result<String, ClassifyError> {
    let guard = session.lock().map_err(|_| ClassifyError::InvalidInput {
        message: "Failed to acquire session lock".to_string(),
    })?;
    guard
        .inputs
        .first()
        .map(|input| input.name.clone())
        .ok_or_else(|| ClassifyError::InvalidInput {
            message: "No inputs available in session - model may be invalid or corrupted"
                .to_string(),
        })
}

/// Applies an [`OrtSessionConfig`] to a session builder.
fn apply_ort_config(
    builder: SessionBuilder,
    config: &OrtSessionConfig,
) -> Result<SessionBuilder, ClassifyError> {
    let mut builder = builder.with_log_level(LogLevel::Error)?;

    if let Some(threads) = config.intra_threads {
        builder = builder.with_intra_threads(threads)?;
    }
    if let Some(threads) = config.inter_threads {
        builder = builder.with_inter_threads(threads)?;
    }
    if let Some(parallel) = config.parallel_execution {
        builder = builder.with_parallel_execution(parallel)?;
    }
    if let Some(level) = config.optimization_level {
        let level = match level {
            OrtGraphOptimizationLevel::DisableAll => GraphOptimizationLevel::Disable,
            OrtGraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
            OrtGraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
            OrtGraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        };
        builder = builder.with_optimization_level(level)?;
    }
    if let Some(providers) = &config.execution_providers {
        let dispatches: Vec<ExecutionProviderDispatch> = providers
            .iter()
            .map(|provider| match provider {
                OrtExecutionProvider::CPU => CPUExecutionProvider::default().build(),
                OrtExecutionProvider::CUDA { device_id } => {
                    let mut ep = CUDAExecutionProvider::default();
                    if let Some(id) = device_id {
                        ep = ep.with_device_id(*id);
                    }
                    ep.build()
                }
                OrtExecutionProvider::DirectML { device_id } => {
                    let mut ep = DirectMLExecutionProvider::default();
                    if let Some(id) = device_id {
                        ep = ep.with_device_id(*id);
                    }
                    ep.build()
                }
                OrtExecutionProvider::CoreML => CoreMLExecutionProvider::default().build(),
            })
            .collect();
        builder = builder.with_execution_providers(dispatches)?;
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file_fails_with_model_load() {
        let result = OrtInfer::new("nonexistent_model.onnx", None);
        assert!(matches!(result, Err(ClassifyError::ModelLoad { .. })));
    }

    #[test]
    fn test_from_config_respects_session_pool_size() {
        let config = ModelConfig::new().session_pool_size(3);
        let result = OrtInfer::from_config(&config, "nonexistent_model.onnx", None);
        assert!(result.is_err());
    }
}
