//! Tensor type aliases used across the pipeline.

/// 2D tensor of f32 values (batch_size x num_classes).
pub type Tensor2D = ndarray::Array2<f32>;

/// 4D tensor of f32 values (batch_size x channels x height x width in CHW
/// order, or batch_size x height x width x channels in HWC order).
pub type Tensor4D = ndarray::Array4<f32>;
