//! Image preprocessing filters for OCR input
//!
//! Grayscale, histogram equalization and fixed-threshold binarization,
//! then expansion back to RGBA for the recognizer. Width and height are
//! preserved by every step.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgba, RgbaImage};
use imageproc::stats::histogram;
use tracing::debug;

use crate::error::PipelineError;

/// Default binarization threshold
pub const DEFAULT_THRESHOLD: u8 = 150;

// Luma weights 0.299 / 0.587 / 0.114 in 14-bit fixed point
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Preprocessing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessConfig {
    /// Pixels strictly above this become white, the rest black
    pub threshold: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Full preprocessing pipeline: grayscale, equalize, binarize, expand to RGBA
pub fn preprocess(image: &DynamicImage, config: &PreprocessConfig) -> Result<RgbaImage, PipelineError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidImage(format!(
            "image has zero dimension ({}x{})",
            width, height
        )));
    }

    debug!("Preprocessing {}x{} image, threshold={}", width, height, config.threshold);

    let gray = to_grayscale(image);
    let equalized = equalize_histogram(&gray);
    let binary = binarize(&equalized, config.threshold);
    Ok(expand_to_rgba(&binary))
}

/// Convert to single-channel grayscale using luma weights (alpha ignored)
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    let rgba = image.to_rgba8();
    ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, _]) = *rgba.get_pixel(x, y);
        Luma([luma(r, g, b)])
    })
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT;
    ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT).min(255) as u8
}

/// Spread intensities over 0..=255 using the image's cumulative histogram
///
/// The darkest populated intensity maps to 0 and the brightest to 255.
/// An image holding a single intensity is returned unchanged.
pub fn equalize_histogram(image: &GrayImage) -> GrayImage {
    let hist = histogram(image).channels[0];
    let total: u64 = hist.iter().map(|&c| c as u64).sum();

    let Some(first) = hist.iter().position(|&c| c > 0) else {
        return image.clone();
    };
    let first_count = hist[first] as u64;
    if first_count == total {
        return image.clone();
    }

    let scale = 255.0 / (total - first_count) as f64;
    let mut lookup = [0u8; 256];
    let mut cumulative = 0u64;
    for i in (first + 1)..256 {
        cumulative += hist[i] as u64;
        lookup[i] = (cumulative as f64 * scale).round().clamp(0.0, 255.0) as u8;
    }

    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        Luma([lookup[image.get_pixel(x, y)[0] as usize]])
    })
}

/// Fixed-threshold binarization: `> threshold` becomes 255, else 0
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let value = image.get_pixel(x, y)[0];
        Luma([if value > threshold { 255 } else { 0 }])
    })
}

/// Duplicate the gray value across RGB at full opacity
pub fn expand_to_rgba(image: &GrayImage) -> RgbaImage {
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y)[0];
        Rgba([v, v, v, 255])
    })
}
