//! Application Configuration
//!
//! User settings and preferences stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::OutputMode;
use crate::vision::preprocess::DEFAULT_THRESHOLD;
use crate::vision::{PreprocessConfig, RecognizerOptions, VisionConfig};

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Preprocessing and output settings
    pub pipeline: PipelineSettings,
    /// OCR engine options
    pub recognizer: RecognizerOptions,
    /// Image source settings
    pub capture: CaptureSettings,
}

/// Preprocessing and output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Feed the preprocessed image to OCR instead of the raw crop
    pub preprocess: bool,
    /// Binarization threshold
    pub threshold: u8,
    /// How recognized text is rendered
    pub output_mode: OutputMode,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            preprocess: true,
            threshold: DEFAULT_THRESHOLD,
            output_mode: OutputMode::Tokenized,
        }
    }
}

impl PipelineSettings {
    /// Image-side view of these settings
    pub fn vision_config(&self) -> VisionConfig {
        VisionConfig {
            preprocess: self.preprocess,
            preprocess_config: PreprocessConfig {
                threshold: self.threshold,
            },
        }
    }
}

/// Image source settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Directory receiving camera captures (data dir when unset)
    pub capture_dir: Option<PathBuf>,
    /// Program and arguments that take a picture; `{output}` is replaced by
    /// the destination path. The camera is unavailable when unset.
    pub camera_command: Option<Vec<String>>,
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert!(config.pipeline.preprocess);
        assert_eq!(config.pipeline.threshold, 150);
        assert_eq!(config.pipeline.output_mode, OutputMode::Tokenized);

        assert_eq!(config.recognizer.language, "eng");
        assert!(config.capture.capture_dir.is_none());
        assert!(config.capture.camera_command.is_none());
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.pipeline.output_mode = OutputMode::Raw;
        config.pipeline.threshold = 120;
        config.recognizer.language = "por".to_string();
        config.capture.capture_dir = Some(PathBuf::from("/tmp/shots"));

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig = toml::from_str("[pipeline]\noutput_mode = \"raw\"\n").unwrap();
        assert_eq!(parsed.pipeline.output_mode, OutputMode::Raw);
        assert!(parsed.pipeline.preprocess);
        assert_eq!(parsed.pipeline.threshold, 150);
        assert_eq!(parsed.recognizer, RecognizerOptions::default());
    }

    #[test]
    fn test_camera_command_from_toml() {
        let parsed: AppConfig = toml::from_str(
            "[capture]\ncamera_command = [\"fswebcam\", \"--no-banner\", \"{output}\"]\n",
        )
        .unwrap();
        assert_eq!(
            parsed.capture.camera_command,
            Some(vec!["fswebcam".to_string(), "--no-banner".to_string(), "{output}".to_string()])
        );
        assert!(parsed.capture.capture_dir.is_none());
    }

    #[test]
    fn test_vision_config_from_pipeline() {
        let settings = PipelineSettings {
            preprocess: false,
            threshold: 90,
            output_mode: OutputMode::Raw,
        };
        let vision = settings.vision_config();
        assert!(!vision.preprocess);
        assert_eq!(vision.preprocess_config.threshold, 90);
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();
        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
