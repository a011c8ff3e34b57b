//! Flower photo classification from the command line.
//!
//! Stands in for the photo-picking UI: it supplies decoded images to the
//! classifier and renders each outcome as `label (confidence%)` or
//! `Unknown`.
//!
//! Usage:
//! ```
//! cargo run --bin classify -- --model-path <path_to_model> <image_paths>...
//! ```

use clap::Parser;
use flora_id::classifier::{Classifier, ImageClassifierBuilder, ImageClassifierConfig};
use flora_id::core::init_tracing;
use flora_id::utils::load_images;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Command-line arguments for the classification tool
#[derive(Parser)]
#[command(name = "classify")]
#[command(about = "Classifies flower photos with a pre-trained ONNX model")]
struct Args {
    /// Path to the ONNX model file
    #[arg(short, long)]
    model_path: PathBuf,

    /// Optional file with one class label per line (defaults to the
    /// Oxford-102 flower labels)
    #[arg(short, long)]
    labels_file: Option<PathBuf>,

    /// Optional JSON file with classifier configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Image file paths to classify
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = Args::parse();

    if !args.model_path.exists() {
        error!("Model file not found: {}", args.model_path.display());
        return Err("Model file not found".into());
    }

    // Drop missing image paths up front, mirroring what a picker UI enforces.
    let existing_images: Vec<PathBuf> = args
        .images
        .iter()
        .filter(|path| {
            let exists = path.exists();
            if !exists {
                error!("Image file not found: {}", path.display());
            }
            exists
        })
        .cloned()
        .collect();

    if existing_images.is_empty() {
        error!("No valid image files found");
        return Err("No valid image files found".into());
    }

    let mut builder = match &args.config {
        Some(config_path) => {
            let json = std::fs::read_to_string(config_path)?;
            let config: ImageClassifierConfig = serde_json::from_str(&json)?;
            ImageClassifierBuilder::from_config(config)
        }
        None => ImageClassifierBuilder::new(),
    };

    if let Some(labels_path) = &args.labels_file {
        builder = builder.labels_file(labels_path)?;
    }

    let classifier = builder.build(Path::new(&args.model_path))?;
    info!(
        "Loaded model '{}' with input shape {:?}",
        classifier.model_name(),
        classifier.input_shape()
    );

    let images = load_images(&existing_images)?;

    let mut classified = 0usize;
    for (path, image) in existing_images.iter().zip(images) {
        match classifier.classify(&image) {
            Ok(outcome) => {
                info!("{}: {}", path.display(), outcome);
                classified += 1;
            }
            Err(e) => {
                error!("Classification failed for {}: {}", path.display(), e);
            }
        }
    }

    if classified == 0 {
        return Err("No image could be classified".into());
    }

    Ok(())
}
