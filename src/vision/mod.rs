//! Vision/OCR Layer
//!
//! Prepares captured images for recognition and hands them to an OCR
//! backend:
//! - `preprocess`: grayscale, equalization and binarization
//! - `ocr`: the recognizer boundary
//! - `tesseract`: system tesseract backend

pub mod ocr;
pub mod preprocess;
pub mod tesseract;

pub use ocr::{RecognitionError, RecognizerOptions, TextRecognizer};
pub use preprocess::{preprocess, PreprocessConfig};
pub use tesseract::TesseractRecognizer;

use image::{DynamicImage, RgbaImage};
use std::time::Instant;
use tracing::debug;

use crate::error::PipelineError;

/// Image-side settings of a recognition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisionConfig {
    /// Whether the recognizer receives the preprocessed image or the raw crop
    pub preprocess: bool,
    /// Preprocessing parameters
    pub preprocess_config: PreprocessConfig,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            preprocess: true,
            preprocess_config: PreprocessConfig::default(),
        }
    }
}

/// Produce the image handed to the recognizer
pub fn prepare_for_ocr(image: &DynamicImage, config: &VisionConfig) -> Result<RgbaImage, PipelineError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::InvalidImage(format!(
            "image has zero dimension ({}x{})",
            image.width(),
            image.height()
        )));
    }

    if !config.preprocess {
        debug!("OCR preprocessing disabled, passing raw image");
        return Ok(image.to_rgba8());
    }

    let start = Instant::now();
    let prepared = preprocess(image, &config.preprocess_config)?;
    debug!("Preprocessing complete in {:?}", start.elapsed());
    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbImage};

    #[test]
    fn test_prepare_raw_passthrough() {
        let raw = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let config = VisionConfig {
            preprocess: false,
            ..VisionConfig::default()
        };
        let out = prepare_for_ocr(&DynamicImage::ImageRgba8(raw.clone()), &config).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_prepare_rejects_empty_even_without_preprocessing() {
        let config = VisionConfig {
            preprocess: false,
            ..VisionConfig::default()
        };
        let result = prepare_for_ocr(&DynamicImage::ImageRgb8(RgbImage::new(0, 0)), &config);
        assert!(matches!(result, Err(PipelineError::InvalidImage(_))));
    }

    #[test]
    fn test_prepare_preprocessed_keeps_size() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(5, 4, |x, y| {
            image::Rgb([(x * 40) as u8, (y * 60) as u8, 0])
        }));
        let out = prepare_for_ocr(&img, &VisionConfig::default()).unwrap();
        assert_eq!(out.dimensions(), (5, 4));
    }
}
