//! Pipeline error taxonomy
//!
//! Every variant is terminal for the request that produced it. Nothing is
//! retried; the session turns each one into a single user notification.

use thiserror::Error;

use crate::capture::CaptureError;
use crate::vision::RecognitionError;

/// Errors surfaced by a capture-recognize cycle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Empty or malformed image handed to preprocessing or cropping
    #[error("invalid image: {0}")]
    InvalidImage(String),
    /// The OCR backend reported a failure
    #[error("text recognition failed: {0}")]
    RecognitionFailure(String),
    /// Recognition was requested before any image was supplied
    #[error("no image selected")]
    NoImageSelected,
    /// The image source could not decode the requested image
    #[error("failed to load image: {0}")]
    ImageLoad(String),
}

impl PipelineError {
    /// Short text shown on the notification surface
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::NoImageSelected => "Please select an image first".to_string(),
            PipelineError::RecognitionFailure(msg) => format!("Failed to recognize text: {}", msg),
            PipelineError::InvalidImage(msg) | PipelineError::ImageLoad(msg) => {
                format!("Error processing image: {}", msg)
            }
        }
    }
}

impl From<RecognitionError> for PipelineError {
    fn from(err: RecognitionError) -> Self {
        PipelineError::RecognitionFailure(err.to_string())
    }
}

impl From<CaptureError> for PipelineError {
    fn from(err: CaptureError) -> Self {
        match &err {
            CaptureError::InvalidCrop { .. } => PipelineError::InvalidImage(err.to_string()),
            _ => PipelineError::ImageLoad(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            PipelineError::NoImageSelected.user_message(),
            "Please select an image first"
        );
        assert_eq!(
            PipelineError::RecognitionFailure("engine offline".into()).user_message(),
            "Failed to recognize text: engine offline"
        );
        assert_eq!(
            PipelineError::InvalidImage("zero width".into()).user_message(),
            "Error processing image: zero width"
        );
    }

    #[test]
    fn test_recognition_error_conversion() {
        let err: PipelineError = RecognitionError::Backend("boom".into()).into();
        assert!(matches!(err, PipelineError::RecognitionFailure(ref m) if m.contains("boom")));
    }
}
