//! Analysis Layer
//!
//! Turns recognized text into the string shown on the output surface.

pub mod variables;

pub use variables::{format_output, tokenize, OutputMode};
