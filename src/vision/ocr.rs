//! OCR (Optical Character Recognition) boundary
//!
//! The recognizer is an external collaborator. It receives an RGBA image and
//! an options descriptor and completes once, with text or a failure message.

use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recognizer options descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerOptions {
    /// Recognition language (tesseract language code)
    pub language: String,
    /// Resolution hint passed to the engine
    pub dpi: Option<i32>,
    /// Page segmentation mode
    pub psm: Option<i32>,
}

impl Default for RecognizerOptions {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            dpi: Some(300),
            psm: Some(6), // single uniform block of text
        }
    }
}

/// Raw text produced by one recognition request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecognizedText(String);

impl RecognizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecognizedText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Failure reported by the OCR boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    /// The image could not be handed to the engine
    #[error("unsupported input image: {0}")]
    Input(String),
    /// The engine itself failed
    #[error("{0}")]
    Backend(String),
}

/// Text recognizer backend
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize all text in `image`
    async fn recognize(
        &self,
        image: &RgbaImage,
        options: &RecognizerOptions,
    ) -> Result<RecognizedText, RecognitionError>;
}
