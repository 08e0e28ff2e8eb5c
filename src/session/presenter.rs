//! Presentation boundary
//!
//! A busy indicator, a transient notification surface and a text output
//! surface. Hosts implement `Presenter`; the CLI uses `TerminalPresenter`.

use tracing::info;

/// Presentation surfaces driven by a recognition session
pub trait Presenter: Send + Sync {
    /// Show the busy indicator
    fn show_busy(&self);
    /// Hide the busy indicator
    fn hide_busy(&self);
    /// Show a short transient message
    fn notify(&self, message: &str);
    /// Replace the output text
    fn set_output(&self, text: &str);
    /// Empty the output text
    fn clear_output(&self);
}

/// Writes output to stdout and notifications to stderr
#[derive(Debug, Default)]
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn show_busy(&self) {
        info!("Recognizing text...");
    }

    fn hide_busy(&self) {}

    fn notify(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn set_output(&self, text: &str) {
        if !text.is_empty() {
            println!("{}", text);
        }
    }

    fn clear_output(&self) {}
}
