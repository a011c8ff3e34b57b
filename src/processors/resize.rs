//! Resizing images to the model's trained input shape.
//!
//! Classification models expect a fixed input size. Images are resampled to
//! that size with a configurable filter before normalization; the aspect
//! ratio is not preserved and nothing is cropped. Degenerate but non-empty
//! inputs (for example a 1x1 photo) are upscaled like any other image.

use image::imageops::FilterType;
use image::RgbImage;

/// Resizes an image to the given (width, height) input shape.
///
/// Returns the image unchanged (as a copy) when it already matches the
/// target shape.
pub fn resize_to_input(image: &RgbImage, input_shape: (u32, u32), filter: FilterType) -> RgbImage {
    let (target_width, target_height) = input_shape;
    let (width, height) = image.dimensions();

    if (width, height) == (target_width, target_height) {
        return image.clone();
    }

    tracing::debug!(
        from = %format!("{}x{}", width, height),
        to = %format!("{}x{}", target_width, target_height),
        "resizing image to model input shape"
    );

    image::imageops::resize(image, target_width, target_height, filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_reaches_target_shape() {
        let image = RgbImage::new(640, 480);
        let resized = resize_to_input(&image, (224, 224), FilterType::Lanczos3);
        assert_eq!(resized.dimensions(), (224, 224));
    }

    #[test]
    fn test_matching_shape_is_unchanged() {
        let mut image = RgbImage::new(224, 224);
        image.put_pixel(3, 4, image::Rgb([9, 8, 7]));
        let resized = resize_to_input(&image, (224, 224), FilterType::Lanczos3);
        assert_eq!(resized.get_pixel(3, 4), &image::Rgb([9, 8, 7]));
    }

    #[test]
    fn test_degenerate_input_upscales() {
        let image = RgbImage::new(1, 1);
        let resized = resize_to_input(&image, (224, 224), FilterType::Lanczos3);
        assert_eq!(resized.dimensions(), (224, 224));
    }
}
