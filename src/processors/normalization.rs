//! Pixel buffer preparation for classification models.
//!
//! This module converts a decoded image into the fixed-layout f32 tensor the
//! model consumes. The buffer is always sized exactly to the input image's
//! dimensions; resizing to the model's trained input shape is a separate,
//! earlier stage (see [`crate::processors::resize`]).

use crate::core::errors::ClassifyError;
use crate::core::tensor::Tensor4D;
use crate::processors::types::ChannelOrder;
use image::DynamicImage;

/// Normalizes images into model-ready pixel buffers.
///
/// This struct encapsulates the parameters needed to normalize images,
/// including scaling factors, mean values, standard deviations, and channel
/// ordering. The per-channel multipliers are precomputed as
/// `alpha = scale / std` and `beta = -mean / std`.
#[derive(Debug)]
pub struct NormalizeImage {
    /// Scaling factors for each channel (alpha = scale / std)
    pub alpha: Vec<f32>,
    /// Offset values for each channel (beta = -mean / std)
    pub beta: Vec<f32>,
    /// Channel ordering (CHW or HWC)
    pub order: ChannelOrder,
}

impl NormalizeImage {
    /// Creates a new NormalizeImage instance with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `scale` - Optional scaling factor (defaults to 1.0/255.0)
    /// * `mean` - Optional mean values for each channel (defaults to the
    ///   ImageNet means [0.485, 0.456, 0.406])
    /// * `std` - Optional standard deviation values for each channel
    ///   (defaults to the ImageNet values [0.229, 0.224, 0.225])
    /// * `order` - Optional channel ordering (defaults to CHW)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * Scale is less than or equal to 0
    /// * Mean or std vectors don't have exactly 3 elements
    /// * Any standard deviation value is less than or equal to 0
    pub fn new(
        scale: Option<f32>,
        mean: Option<Vec<f32>>,
        std: Option<Vec<f32>>,
        order: Option<ChannelOrder>,
    ) -> Result<Self, ClassifyError> {
        let scale = scale.unwrap_or(1.0 / 255.0);
        let mean = mean.unwrap_or_else(|| vec![0.485, 0.456, 0.406]);
        let std = std.unwrap_or_else(|| vec![0.229, 0.224, 0.225]);
        let order = order.unwrap_or(ChannelOrder::CHW);

        if scale <= 0.0 {
            return Err(ClassifyError::config_error("Scale must be greater than 0"));
        }

        if mean.len() != 3 {
            return Err(ClassifyError::config_error(
                "Mean must have exactly 3 elements for RGB",
            ));
        }

        if std.len() != 3 {
            return Err(ClassifyError::config_error(
                "Std must have exactly 3 elements for RGB",
            ));
        }

        for (i, &s) in std.iter().enumerate() {
            if s <= 0.0 {
                return Err(ClassifyError::config_error(format!(
                    "Standard deviation at index {i} must be greater than 0, got {s}"
                )));
            }
        }

        let alpha: Vec<f32> = std.iter().map(|s| scale / s).collect();
        let beta: Vec<f32> = mean.iter().zip(&std).map(|(m, s)| -m / s).collect();

        Ok(Self { alpha, beta, order })
    }

    /// Creates a NormalizeImage instance with ImageNet parameters in CHW
    /// order.
    pub fn imagenet() -> Result<Self, ClassifyError> {
        Self::new(None, None, None, None)
    }

    /// Normalizes a single image into a 4D pixel buffer.
    ///
    /// The returned tensor has shape (1, 3, H, W) in CHW order or
    /// (1, H, W, 3) in HWC order, where H and W equal the input image's
    /// dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::BufferAllocation`] when the image has a zero
    /// dimension or the buffer cannot be assembled into the requested shape.
    pub fn normalize_to(&self, img: DynamicImage) -> Result<Tensor4D, ClassifyError> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();
        let channels = 3u32;

        if width == 0 || height == 0 {
            return Err(ClassifyError::buffer_allocation(
                width,
                height,
                "image has a zero dimension",
            ));
        }

        match self.order {
            ChannelOrder::CHW => {
                let mut result = vec![0.0f32; (channels * height * width) as usize];

                for c in 0..channels {
                    for y in 0..height {
                        for x in 0..width {
                            let pixel = rgb_img.get_pixel(x, y);
                            let channel_value = pixel[c as usize] as f32;
                            let dst_idx = (c * height * width + y * width + x) as usize;

                            result[dst_idx] =
                                channel_value * self.alpha[c as usize] + self.beta[c as usize];
                        }
                    }
                }

                let len = result.len();
                ndarray::Array4::from_shape_vec(
                    (1, channels as usize, height as usize, width as usize),
                    result,
                )
                .map_err(|e| {
                    ClassifyError::buffer_allocation(
                        width,
                        height,
                        format!("CHW buffer of {} values rejected: {}", len, e),
                    )
                })
            }
            ChannelOrder::HWC => {
                let mut result = vec![0.0f32; (height * width * channels) as usize];

                for y in 0..height {
                    for x in 0..width {
                        let pixel = rgb_img.get_pixel(x, y);
                        for c in 0..channels {
                            let channel_value = pixel[c as usize] as f32;
                            let dst_idx = (y * width * channels + x * channels + c) as usize;

                            result[dst_idx] =
                                channel_value * self.alpha[c as usize] + self.beta[c as usize];
                        }
                    }
                }

                let len = result.len();
                ndarray::Array4::from_shape_vec(
                    (1, height as usize, width as usize, channels as usize),
                    result,
                )
                .map_err(|e| {
                    ClassifyError::buffer_allocation(
                        width,
                        height,
                        format!("HWC buffer of {} values rejected: {}", len, e),
                    )
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb(rgb);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_rejects_invalid_scale() {
        assert!(NormalizeImage::new(Some(0.0), None, None, None).is_err());
    }

    #[test]
    fn test_rejects_wrong_mean_len() {
        assert!(NormalizeImage::new(None, Some(vec![0.5; 4]), None, None).is_err());
    }

    #[test]
    fn test_rejects_zero_std() {
        assert!(NormalizeImage::new(None, None, Some(vec![0.0, 1.0, 1.0]), None).is_err());
    }

    #[test]
    fn test_chw_buffer_matches_input_dimensions() {
        let normalize = NormalizeImage::imagenet().unwrap();
        let tensor = normalize.normalize_to(solid_image(7, 5, [0, 0, 0])).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 5, 7]);
    }

    #[test]
    fn test_hwc_buffer_matches_input_dimensions() {
        let normalize = NormalizeImage::new(None, None, None, Some(ChannelOrder::HWC)).unwrap();
        let tensor = normalize.normalize_to(solid_image(4, 6, [0, 0, 0])).unwrap();
        assert_eq!(tensor.shape(), &[1, 6, 4, 3]);
    }

    #[test]
    fn test_identity_normalization_values() {
        // scale 1, mean 0, std 1 leaves raw channel values untouched.
        let normalize = NormalizeImage::new(
            Some(1.0),
            Some(vec![0.0, 0.0, 0.0]),
            Some(vec![1.0, 1.0, 1.0]),
            None,
        )
        .unwrap();
        let tensor = normalize
            .normalize_to(solid_image(2, 2, [10, 20, 30]))
            .unwrap();
        assert_eq!(tensor[[0, 0, 0, 0]], 10.0);
        assert_eq!(tensor[[0, 1, 0, 0]], 20.0);
        assert_eq!(tensor[[0, 2, 1, 1]], 30.0);
    }

    #[test]
    fn test_zero_area_image_fails_allocation() {
        let normalize = NormalizeImage::imagenet().unwrap();
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 3));
        let result = normalize.normalize_to(empty);
        assert!(matches!(
            result,
            Err(ClassifyError::BufferAllocation { width: 0, .. })
        ));
    }

    #[test]
    fn test_one_by_one_image_is_valid() {
        let normalize = NormalizeImage::imagenet().unwrap();
        let tensor = normalize
            .normalize_to(solid_image(1, 1, [255, 255, 255]))
            .unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 1, 1]);
    }
}
