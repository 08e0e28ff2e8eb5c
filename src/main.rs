//! scanvars - photo to variables
//!
//! Crops a photo, runs OCR on the region and lists every recognized word as
//! a `varN = word` assignment.

mod analysis;
mod capture;
mod config;
mod error;
mod session;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::analysis::{format_output, tokenize, OutputMode};
use crate::capture::{CapturedImage, CropRegion, FsImageProvider, ImageLocator, ImageProvider, ImageSource};
use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::session::{RecognitionSession, SessionSettings, TerminalPresenter};
use crate::vision::{prepare_for_ocr, TesseractRecognizer};

/// scanvars - turn the words in a photo into variable assignments
#[derive(Parser, Debug)]
#[command(name = "scanvars")]
#[command(about = "Crop a photo, OCR it, and list each word as a variable assignment")]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize the text in a photo
    Recognize {
        /// Photo to recognize
        #[arg(required_unless_present = "camera", conflicts_with = "camera")]
        image: Option<PathBuf>,

        /// Take the photo with the configured camera command
        #[arg(long)]
        camera: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Print recognized text unmodified
        #[arg(long)]
        raw: bool,

        /// Hand the raw crop to OCR, skipping preprocessing
        #[arg(long)]
        no_preprocess: bool,

        /// OCR language (tesseract code, e.g. "eng")
        #[arg(long)]
        lang: Option<String>,

        /// Only recognize these characters
        #[arg(long)]
        whitelist: Option<String>,

        /// Also write the image handed to OCR to this path
        #[arg(long)]
        save_preprocessed: Option<PathBuf>,
    },
    /// Write the preprocessed version of a photo
    Preprocess {
        /// Photo to preprocess
        image: PathBuf,

        /// Output image path
        output: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Turn text into variable assignments
    Tokenize {
        /// Text to tokenize (read from stdin when absent)
        text: Option<String>,

        /// Print the text unmodified
        #[arg(long)]
        raw: bool,

        /// Print assignments as JSON
        #[arg(long, conflicts_with = "raw")]
        json: bool,
    },
    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug)]
struct PipelineArgs {
    /// Crop region as X,Y,W,H in source pixels
    #[arg(long)]
    crop: Option<CropRegion>,

    /// Binarization threshold
    #[arg(long)]
    threshold: Option<u8>,
}

impl PipelineArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(threshold) = self.threshold {
            config.pipeline.threshold = threshold;
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Command::InitConfig { force } = args.command {
        run_init_config(args.config.as_deref(), force)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = load_or_create_config(args.config.as_deref())?;

    match args.command {
        Command::Recognize {
            image,
            camera,
            pipeline,
            raw,
            no_preprocess,
            lang,
            whitelist,
            save_preprocessed,
        } => {
            pipeline.apply(&mut config);
            if raw {
                config.pipeline.output_mode = OutputMode::Raw;
            }
            if no_preprocess {
                config.pipeline.preprocess = false;
            }
            if let Some(lang) = lang {
                config.recognizer.language = lang;
            }
            let (source, picked) = match image {
                Some(path) if !camera => (ImageSource::Gallery, Some(ImageLocator::from(path.as_path()))),
                _ => (ImageSource::Camera, None),
            };
            let mut recognizer = TesseractRecognizer::new();
            if let Some(chars) = whitelist {
                recognizer = recognizer.with_variable("tessedit_char_whitelist", chars);
            }
            let photo = PhotoRequest {
                source,
                picked,
                crop: pipeline.crop,
                save_preprocessed,
            };
            let recognized = run_recognize(&config, recognizer, photo).await?;
            return Ok(if recognized { ExitCode::SUCCESS } else { ExitCode::FAILURE });
        }
        Command::Preprocess { image, output, pipeline } => {
            pipeline.apply(&mut config);
            config.pipeline.preprocess = true;
            run_preprocess(&config, &image, pipeline.crop, &output)?;
        }
        Command::Tokenize { text, raw, json } => run_tokenize(text, raw, json)?,
        Command::InitConfig { .. } => unreachable!("handled before config load"),
    }
    Ok(ExitCode::SUCCESS)
}

/// Load configuration from file or fall back to defaults
fn load_or_create_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = config::load_config(path)?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(config_dir) = storage::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            let config = config::load_config(&config_path)?;
            info!("Loaded configuration from {:?}", config_path);
            return Ok(config);
        }
    }
    info!("Using default configuration");
    Ok(AppConfig::default())
}

/// What the `recognize` command was asked to read
struct PhotoRequest {
    source: ImageSource,
    picked: Option<ImageLocator>,
    crop: Option<CropRegion>,
    save_preprocessed: Option<PathBuf>,
}

/// Recognize one photo in a terminal session
///
/// Returns `false` when the request ended without output; the session has
/// already told the user why.
async fn run_recognize(config: &AppConfig, recognizer: TesseractRecognizer, photo: PhotoRequest) -> Result<bool> {
    let provider = FsImageProvider::new(storage::capture_dir(config)?)
        .with_camera_command(config.capture.camera_command.clone());
    let mut session = RecognitionSession::new(
        Arc::new(provider),
        Arc::new(recognizer),
        Arc::new(TerminalPresenter),
        SessionSettings::from(config),
    );

    let ctrl_c = session.context();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.teardown();
        }
    });

    let recognized = recognize_photo(&mut session, photo).await;
    session.teardown();
    recognized
}

async fn recognize_photo(session: &mut RecognitionSession, photo: PhotoRequest) -> Result<bool> {
    let Some(request) = shown(session.request_image(photo.source, photo.picked)) else {
        return Ok(false);
    };
    if shown(session.select_image(&request)).is_none() {
        return Ok(false);
    }
    if let Some(region) = photo.crop {
        if shown(session.crop(region)).is_none() {
            return Ok(false);
        }
    }

    if let (Some(path), Some(captured)) = (photo.save_preprocessed.as_deref(), session.image()) {
        let prepared = prepare_for_ocr(&captured.image, &session.settings().vision)?;
        prepared
            .save(path)
            .with_context(|| format!("Failed to write {:?}", path))?;
        info!("Wrote OCR input image to {:?}", path);
    }

    Ok(shown(session.recognize().await).flatten().is_some())
}

/// Session errors reach the user through the presenter; only log them here
fn shown<T>(result: Result<T, PipelineError>) -> Option<T> {
    result.map_err(|e| debug!("Request ended: {}", e)).ok()
}

fn run_preprocess(config: &AppConfig, image: &Path, crop: Option<CropRegion>, output: &Path) -> Result<()> {
    let provider = FsImageProvider::new(std::env::temp_dir());
    let locator = ImageLocator::from(image);
    let mut captured = CapturedImage::new(locator.clone(), provider.load(&locator)?);
    if let Some(region) = crop {
        captured.crop(region)?;
    }

    let prepared = prepare_for_ocr(&captured.image, &config.pipeline.vision_config())?;
    prepared
        .save(output)
        .with_context(|| format!("Failed to write {:?}", output))?;
    info!(
        "Wrote {}x{} preprocessed image to {:?}",
        prepared.width(),
        prepared.height(),
        output
    );
    Ok(())
}

fn run_tokenize(text: Option<String>, raw: bool, json: bool) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&tokenize(&text))?);
        return Ok(());
    }

    let mode = if raw { OutputMode::Raw } else { OutputMode::Tokenized };
    let output = format_output(&text, mode);
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

fn run_init_config(explicit: Option<&Path>, force: bool) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => storage::get_config_dir()?.join("config.toml"),
    };
    if path.exists() && !force {
        anyhow::bail!("{:?} already exists (use --force to overwrite)", path);
    }
    config::save_config(&AppConfig::default(), &path)?;
    info!("Wrote default configuration to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Presenter;
    use crate::vision::ocr::{RecognitionError, RecognizedText};
    use crate::vision::{RecognizerOptions, TextRecognizer};
    use async_trait::async_trait;
    use image::{Rgb, RgbImage, RgbaImage};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Collected {
        notes: Mutex<Vec<String>>,
        output: Mutex<Vec<String>>,
    }

    impl Presenter for Collected {
        fn show_busy(&self) {}
        fn hide_busy(&self) {}
        fn notify(&self, message: &str) {
            self.notes.lock().unwrap().push(message.to_string());
        }
        fn set_output(&self, text: &str) {
            self.output.lock().unwrap().push(text.to_string());
        }
        fn clear_output(&self) {}
    }

    struct Echo(&'static str);

    #[async_trait]
    impl TextRecognizer for Echo {
        async fn recognize(
            &self,
            _image: &RgbaImage,
            _options: &RecognizerOptions,
        ) -> Result<RecognizedText, RecognitionError> {
            Ok(RecognizedText::from(self.0.to_string()))
        }
    }

    fn session(dir: &TempDir, presenter: Arc<Collected>) -> RecognitionSession {
        RecognitionSession::new(
            Arc::new(FsImageProvider::new(dir.path().to_path_buf())),
            Arc::new(Echo("total 42")),
            presenter,
            SessionSettings::default(),
        )
    }

    fn gallery(path: &Path) -> PhotoRequest {
        PhotoRequest {
            source: ImageSource::Gallery,
            picked: Some(ImageLocator::from(path)),
            crop: None,
            save_preprocessed: None,
        }
    }

    #[tokio::test]
    async fn test_missing_photo_fails_with_one_message() {
        let dir = TempDir::new().unwrap();
        let presenter = Arc::new(Collected::default());
        let mut session = session(&dir, presenter.clone());

        let recognized = recognize_photo(&mut session, gallery(&dir.path().join("missing.png"))).await;
        assert!(!recognized.unwrap());
        let notes = presenter.notes.lock().unwrap().clone();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].starts_with("Error processing image:"));
    }

    #[tokio::test]
    async fn test_camera_without_command_fails_with_one_message() {
        let dir = TempDir::new().unwrap();
        let presenter = Arc::new(Collected::default());
        let mut session = session(&dir, presenter.clone());

        let photo = PhotoRequest {
            source: ImageSource::Camera,
            picked: None,
            crop: None,
            save_preprocessed: None,
        };
        assert!(!recognize_photo(&mut session, photo).await.unwrap());
        assert_eq!(*presenter.notes.lock().unwrap(), vec!["Camera permission denied".to_string()]);
    }

    #[tokio::test]
    async fn test_recognized_photo_succeeds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.png");
        RgbImage::from_pixel(8, 8, Rgb([200, 200, 200])).save(&path).unwrap();
        let presenter = Arc::new(Collected::default());
        let mut session = session(&dir, presenter.clone());

        let mut photo = gallery(&path);
        photo.save_preprocessed = Some(dir.path().join("ocr-input.png"));
        assert!(recognize_photo(&mut session, photo).await.unwrap());
        assert_eq!(*presenter.output.lock().unwrap(), vec!["var1 = total\nvar2 = 42".to_string()]);
        assert!(presenter.notes.lock().unwrap().is_empty());
        assert!(dir.path().join("ocr-input.png").is_file());
    }

    #[tokio::test]
    async fn test_torn_down_session_reports_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.png");
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])).save(&path).unwrap();
        let presenter = Arc::new(Collected::default());
        let mut session = session(&dir, presenter.clone());
        session.teardown();

        assert!(!recognize_photo(&mut session, gallery(&path)).await.unwrap());
        assert!(presenter.output.lock().unwrap().is_empty());
    }
}
