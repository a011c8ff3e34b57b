//! Utility functions for image and label I/O.

use crate::core::errors::ClassifyError;
use image::{DynamicImage, ImageBuffer, RgbImage};
use std::io::BufRead;
use std::path::Path;

/// Number of images above which loading switches to parallel decode.
const PARALLEL_DECODE_THRESHOLD: usize = 4;

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns [`ClassifyError::ImageLoad`] if the image cannot be decoded.
pub fn load_image(path: &Path) -> Result<RgbImage, ClassifyError> {
    let img = image::open(path).map_err(ClassifyError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Loads a batch of images from file paths.
///
/// Decodes in parallel when the number of images exceeds a small threshold.
///
/// # Errors
///
/// Returns the first decode error encountered.
pub fn load_images<P: AsRef<Path> + Send + Sync>(paths: &[P]) -> Result<Vec<RgbImage>, ClassifyError> {
    if paths.len() > PARALLEL_DECODE_THRESHOLD {
        use rayon::prelude::*;
        paths.par_iter().map(|p| load_image(p.as_ref())).collect()
    } else {
        paths.iter().map(|p| load_image(p.as_ref())).collect()
    }
}

/// Creates an RgbImage from raw pixel data.
///
/// The data must be in RGB format (3 bytes per pixel) and the length must
/// match the specified width and height.
///
/// # Returns
///
/// * `Some(RgbImage)` - The created RGB image if the data is valid
/// * `None` - If the data length doesn't match the specified dimensions
pub fn create_rgb_image(width: u32, height: u32, data: Vec<u8>) -> Option<RgbImage> {
    if data.len() != (width * height * 3) as usize {
        return None;
    }

    ImageBuffer::from_raw(width, height, data)
}

/// Loads a class label table from a file with one label per line.
///
/// Blank lines are skipped; surrounding whitespace is trimmed.
///
/// # Errors
///
/// Returns [`ClassifyError::Io`] when the file cannot be read and
/// [`ClassifyError::InvalidInput`] when it contains no labels.
pub fn labels_from_file(path: &Path) -> Result<Vec<String>, ClassifyError> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);

    let mut labels = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            labels.push(trimmed.to_string());
        }
    }

    if labels.is_empty() {
        return Err(ClassifyError::invalid_input(format!(
            "label file '{}' contains no labels",
            path.display()
        )));
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_create_rgb_image_valid_data() {
        let image = create_rgb_image(2, 2, vec![0u8; 12]).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
    }

    #[test]
    fn test_create_rgb_image_length_mismatch() {
        assert!(create_rgb_image(2, 2, vec![0u8; 11]).is_none());
    }

    #[test]
    fn test_load_image_missing_file() {
        let result = load_image(Path::new("no_such_image.jpg"));
        assert!(matches!(result, Err(ClassifyError::ImageLoad(_))));
    }

    #[test]
    fn test_labels_from_file_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "daffodil\n\n  rose  \n").unwrap();

        let labels = labels_from_file(file.path()).unwrap();
        assert_eq!(labels, vec!["daffodil", "rose"]);
    }

    #[test]
    fn test_labels_from_file_rejects_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = labels_from_file(file.path());
        assert!(matches!(result, Err(ClassifyError::InvalidInput { .. })));
    }
}
