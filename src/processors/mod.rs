//! Image processing stages of the classification pipeline.
//!
//! This module provides the stages that turn a decoded photo into a tensor
//! the model consumes, and the stage that turns raw model scores back into a
//! ranked prediction:
//!
//! * `resize` - Resizing images to the model's trained input shape
//! * `normalization` - Pixel buffer preparation with per-channel scaling
//! * `topk` - Ranked-output selection and score normalization
//! * `types` - Type definitions shared across the processors

pub mod normalization;
pub mod resize;
pub mod topk;
pub mod types;

pub use normalization::NormalizeImage;
pub use resize::resize_to_input;
pub use topk::{softmax, Topk, TopkResult};
pub use types::ChannelOrder;
