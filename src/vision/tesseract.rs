//! Tesseract OCR backend
//!
//! Drives the system `tesseract` binary through rusty-tesseract. The call is
//! blocking, so it runs on tokio's blocking pool.

use async_trait::async_trait;
use image::{DynamicImage, RgbaImage};
use rusty_tesseract::{Args, Image};
use std::collections::HashMap;
use tracing::{debug, info};

use super::ocr::{RecognitionError, RecognizedText, RecognizerOptions, TextRecognizer};

/// Tesseract-backed recognizer
#[derive(Debug, Clone, Default)]
pub struct TesseractRecognizer {
    /// Extra `-c name=value` variables forwarded to tesseract
    config_variables: HashMap<String, String>,
}

impl TesseractRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a tesseract config variable (e.g. `tessedit_char_whitelist`)
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config_variables.insert(name.into(), value.into());
        self
    }

    fn args(&self, options: &RecognizerOptions) -> Args {
        Args {
            lang: options.language.clone(),
            config_variables: self.config_variables.clone(),
            dpi: options.dpi,
            psm: options.psm,
            oem: Some(3), // default engine mode
        }
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(
        &self,
        image: &RgbaImage,
        options: &RecognizerOptions,
    ) -> Result<RecognizedText, RecognitionError> {
        info!(
            "Running tesseract ({}) on {}x{} image",
            options.language,
            image.width(),
            image.height()
        );

        let dynamic = DynamicImage::ImageRgba8(image.clone());
        let args = self.args(options);

        let text = tokio::task::spawn_blocking(move || {
            let tess_img = Image::from_dynamic_image(&dynamic)
                .map_err(|e| RecognitionError::Input(e.to_string()))?;
            rusty_tesseract::image_to_string(&tess_img, &args)
                .map_err(|e| RecognitionError::Backend(e.to_string()))
        })
        .await
        .map_err(|e| RecognitionError::Backend(format!("recognition task aborted: {}", e)))??;

        debug!("Tesseract returned {} bytes of text", text.len());
        Ok(RecognizedText::from(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_follow_options() {
        let recognizer = TesseractRecognizer::new().with_variable("tessedit_char_whitelist", "abc");
        let options = RecognizerOptions {
            language: "por".to_string(),
            dpi: None,
            psm: Some(11),
        };
        let args = recognizer.args(&options);
        assert_eq!(args.lang, "por");
        assert_eq!(args.dpi, None);
        assert_eq!(args.psm, Some(11));
        assert_eq!(args.config_variables.get("tessedit_char_whitelist").map(String::as_str), Some("abc"));
    }
}
