//! Image Source Layer
//!
//! Photos come from a camera capture or from an already stored image. The
//! source choice is routed to one of two request builders; the provider then
//! decodes whatever the request's locator points at.

pub mod frame;

use image::DynamicImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

pub use frame::{CapturedImage, CropRegion};

/// Where a photo comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Camera,
    Gallery,
}

/// Opaque handle naming a stored image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageLocator(String);

impl ImageLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Path> for ImageLocator {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

impl fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request to obtain a photo from a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureRequest {
    /// The capture device writes a new picture to `destination`
    Camera {
        destination: ImageLocator,
        title: String,
        description: String,
    },
    /// The user picked an existing image
    Gallery { picked: ImageLocator },
}

impl CaptureRequest {
    /// The locator the photo can be loaded from once the request completes
    pub fn locator(&self) -> &ImageLocator {
        match self {
            CaptureRequest::Camera { destination, .. } => destination,
            CaptureRequest::Gallery { picked } => picked,
        }
    }
}

/// Image source failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("image not found: {0}")]
    NotFound(String),
    #[error("could not decode {locator}: {message}")]
    Decode { locator: String, message: String },
    #[error("gallery request without a picked image")]
    NothingPicked,
    #[error("Camera permission denied")]
    PermissionDenied,
    #[error("camera capture failed: {0}")]
    CameraFailed(String),
    #[error("crop region {region} outside {width}x{height} image")]
    InvalidCrop {
        region: CropRegion,
        width: u32,
        height: u32,
    },
}

/// Image source boundary
pub trait ImageProvider: Send + Sync {
    /// Build the request for `source`; `picked` is the gallery selection
    fn request(&self, source: ImageSource, picked: Option<ImageLocator>) -> Result<CaptureRequest, CaptureError>;

    /// Carry the request out so its locator can be loaded
    fn fulfil(&self, request: &CaptureRequest) -> Result<(), CaptureError>;

    /// Decode the image behind `locator`
    fn load(&self, locator: &ImageLocator) -> Result<DynamicImage, CaptureError>;
}

/// Camera request with a fresh destination under `capture_dir`
pub fn camera_request(capture_dir: &Path) -> CaptureRequest {
    let file_name = format!("capture-{}.png", uuid::Uuid::new_v4());
    CaptureRequest::Camera {
        destination: ImageLocator::new(capture_dir.join(file_name).to_string_lossy()),
        title: "New Picture".to_string(),
        description: "From Camera".to_string(),
    }
}

/// Gallery request for an already chosen image
pub fn gallery_request(picked: Option<ImageLocator>) -> Result<CaptureRequest, CaptureError> {
    picked
        .map(|picked| CaptureRequest::Gallery { picked })
        .ok_or(CaptureError::NothingPicked)
}

/// Placeholder replaced by the destination path in camera commands
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// File-system backed image source
///
/// Camera requests are carried out by an external capture command that
/// writes the picture to the request's destination. Without one, the camera
/// is unavailable.
#[derive(Debug, Clone)]
pub struct FsImageProvider {
    capture_dir: PathBuf,
    camera_command: Option<Vec<String>>,
}

impl FsImageProvider {
    pub fn new(capture_dir: PathBuf) -> Self {
        Self {
            capture_dir,
            camera_command: None,
        }
    }

    /// Enable the camera through `command` (`{output}` marks the destination)
    pub fn with_camera_command(mut self, command: Option<Vec<String>>) -> Self {
        self.camera_command = command.filter(|c| !c.is_empty());
        self
    }
}

impl ImageProvider for FsImageProvider {
    fn request(&self, source: ImageSource, picked: Option<ImageLocator>) -> Result<CaptureRequest, CaptureError> {
        debug!("Building {:?} capture request", source);
        match source {
            ImageSource::Camera if self.camera_command.is_none() => Err(CaptureError::PermissionDenied),
            ImageSource::Camera => Ok(camera_request(&self.capture_dir)),
            ImageSource::Gallery => gallery_request(picked),
        }
    }

    fn fulfil(&self, request: &CaptureRequest) -> Result<(), CaptureError> {
        let CaptureRequest::Camera { destination, title, .. } = request else {
            return Ok(());
        };
        let Some((program, args)) = self.camera_command.as_deref().and_then(<[String]>::split_first) else {
            return Err(CaptureError::PermissionDenied);
        };

        let args: Vec<String> = args
            .iter()
            .map(|a| a.replace(OUTPUT_PLACEHOLDER, destination.as_str()))
            .collect();
        info!("Capturing '{}' with {} {:?}", title, program, args);

        let status = Command::new(program)
            .args(&args)
            .status()
            .map_err(|e| CaptureError::CameraFailed(format!("{}: {}", program, e)))?;
        if !status.success() {
            return Err(CaptureError::CameraFailed(format!("{} exited with {}", program, status)));
        }
        Ok(())
    }

    fn load(&self, locator: &ImageLocator) -> Result<DynamicImage, CaptureError> {
        let path = Path::new(locator.as_str());
        if !path.exists() {
            return Err(CaptureError::NotFound(locator.to_string()));
        }

        let image = image::open(path).map_err(|e| CaptureError::Decode {
            locator: locator.to_string(),
            message: e.to_string(),
        })?;
        info!("Loaded {}x{} image from {}", image.width(), image.height(), locator);
        Ok(image)
    }
}
