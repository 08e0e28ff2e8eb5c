//! Recognition Session
//!
//! One screen's worth of state: the selected photo, its crop, and the
//! single in-flight recognition. Completions are dropped once the session's
//! context has been torn down, and at most one completion is acted upon per
//! request.

pub mod presenter;

pub use presenter::{Presenter, TerminalPresenter};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analysis::{format_output, OutputMode};
use crate::capture::{CaptureRequest, CapturedImage, CropRegion, ImageLocator, ImageProvider, ImageSource};
use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::vision::{prepare_for_ocr, RecognizerOptions, TextRecognizer, VisionConfig};

/// Per-session pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSettings {
    pub vision: VisionConfig,
    pub output_mode: OutputMode,
    pub recognizer: RecognizerOptions,
}

impl From<&AppConfig> for SessionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            vision: config.pipeline.vision_config(),
            output_mode: config.pipeline.output_mode,
            recognizer: config.recognizer.clone(),
        }
    }
}

/// Liveness of the context that owns a session
///
/// Cloned into whatever tears the host down; `teardown` may run while a
/// recognition is pending.
#[derive(Clone)]
pub struct ScreenContext {
    token: CancellationToken,
    busy: Arc<AtomicBool>,
    presenter: Arc<dyn Presenter>,
}

impl ScreenContext {
    fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self {
            token: CancellationToken::new(),
            busy: Arc::new(AtomicBool::new(false)),
            presenter,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Tear the context down, dismissing the busy indicator if shown
    pub fn teardown(&self) {
        if self.token.is_cancelled() {
            return;
        }
        info!("Session context torn down");
        self.token.cancel();
        if self.busy.swap(false, Ordering::SeqCst) {
            self.presenter.hide_busy();
        }
    }

    /// Show the busy indicator unless the context is already torn down
    fn show_busy(&self) -> bool {
        self.busy.store(true, Ordering::SeqCst);
        if self.token.is_cancelled() {
            self.busy.store(false, Ordering::SeqCst);
            return false;
        }
        self.presenter.show_busy();
        true
    }

    fn hide_busy(&self) {
        if self.busy.swap(false, Ordering::SeqCst) {
            self.presenter.hide_busy();
        }
    }
}

/// Capture, crop and recognize, one request at a time
pub struct RecognitionSession {
    provider: Arc<dyn ImageProvider>,
    recognizer: Arc<dyn TextRecognizer>,
    presenter: Arc<dyn Presenter>,
    settings: SessionSettings,
    context: ScreenContext,
    image: Option<CapturedImage>,
    requests: u64,
}

impl RecognitionSession {
    pub fn new(
        provider: Arc<dyn ImageProvider>,
        recognizer: Arc<dyn TextRecognizer>,
        presenter: Arc<dyn Presenter>,
        settings: SessionSettings,
    ) -> Self {
        let context = ScreenContext::new(presenter.clone());
        Self {
            provider,
            recognizer,
            presenter,
            settings,
            context,
            image: None,
            requests: 0,
        }
    }

    /// Handle for tearing this session's context down
    pub fn context(&self) -> ScreenContext {
        self.context.clone()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    /// Build the request for a capture source, notifying on refusal
    pub fn request_image(
        &self,
        source: ImageSource,
        picked: Option<ImageLocator>,
    ) -> Result<CaptureRequest, PipelineError> {
        self.provider.request(source, picked).map_err(|e| {
            self.notify(&e.to_string());
            PipelineError::from(e)
        })
    }

    /// Carry the request out and load the photo it points at
    pub fn select_image(&mut self, request: &CaptureRequest) -> Result<(), PipelineError> {
        let locator = request.locator().clone();
        match self.provider.fulfil(request).and_then(|()| self.provider.load(&locator)) {
            Ok(image) => {
                self.image = Some(CapturedImage::new(locator, image));
                Ok(())
            }
            Err(e) => {
                let err = PipelineError::from(e);
                self.notify(&err.user_message());
                Err(err)
            }
        }
    }

    /// Crop the selected photo
    pub fn crop(&mut self, region: CropRegion) -> Result<(), PipelineError> {
        let Some(captured) = self.image.as_mut() else {
            let err = PipelineError::NoImageSelected;
            self.notify(&err.user_message());
            return Err(err);
        };

        match captured.crop(region) {
            Ok(()) => {
                debug!("Cropped to {}", region);
                self.notify("Image cropped successfully!");
                Ok(())
            }
            Err(e) => {
                self.notify(&format!("Crop failed: {}", e));
                Err(e.into())
            }
        }
    }

    /// Run OCR on the selected photo and publish the formatted result
    ///
    /// Returns `Ok(None)` when the context was torn down before the
    /// recognizer completed; nothing is presented in that case.
    pub async fn recognize(&mut self) -> Result<Option<String>, PipelineError> {
        if !self.context.is_alive() {
            debug!("Ignoring recognition request on torn-down session");
            return Ok(None);
        }

        self.presenter.clear_output();
        self.requests += 1;
        let request_id = self.requests;

        let Some(captured) = self.image.as_ref() else {
            let err = PipelineError::NoImageSelected;
            self.notify(&err.user_message());
            return Err(err);
        };

        let prepared = match prepare_for_ocr(&captured.image, &self.settings.vision) {
            Ok(prepared) => prepared,
            Err(err) => {
                self.notify(&err.user_message());
                return Err(err);
            }
        };

        info!(
            "Recognition request {} on {}x{} image from {} (selected {:?} ago)",
            request_id,
            prepared.width(),
            prepared.height(),
            captured.locator,
            captured.timestamp.elapsed()
        );

        // The presenter may have torn the context down while output was cleared
        if !self.context.show_busy() {
            debug!("Context torn down before request {} reached the recognizer", request_id);
            return Ok(None);
        }
        let token = self.context.token.clone();
        let completion = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.recognizer.recognize(&prepared, &self.settings.recognizer) => Some(result),
        };

        let Some(result) = completion.filter(|_| self.context.is_alive()) else {
            debug!("Dropping completion of request {} after teardown", request_id);
            return Ok(None);
        };

        self.context.hide_busy();
        match result {
            Ok(text) => {
                let output = format_output(text.as_str(), self.settings.output_mode);
                self.presenter.set_output(&output);
                Ok(Some(output))
            }
            Err(e) => {
                warn!("Recognition request {} failed: {}", request_id, e);
                let err = PipelineError::from(e);
                self.notify(&err.user_message());
                Err(err)
            }
        }
    }

    /// Tear the session's context down
    pub fn teardown(&self) {
        self.context.teardown();
    }

    fn notify(&self, message: &str) {
        if self.context.is_alive() {
            self.presenter.notify(message);
        }
    }
}
