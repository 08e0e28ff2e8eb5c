//! Recognized text to pseudo-variable assignments
//!
//! Tokenization is purely whitespace based: symbols such as `=` are words
//! like any other.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// How recognized text is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// One `varN = word` line per token
    #[default]
    Tokenized,
    /// Recognized text unmodified
    Raw,
}

/// The Nth whitespace-delimited token of recognized text (1-based)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAssignment {
    pub index: usize,
    pub word: String,
}

impl fmt::Display for TokenAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var{} = {}", self.index, self.word)
    }
}

/// Split on whitespace runs and number the surviving tokens from 1
pub fn tokenize(text: &str) -> Vec<TokenAssignment> {
    text.split_whitespace()
        .enumerate()
        .map(|(i, word)| TokenAssignment {
            index: i + 1,
            word: word.to_string(),
        })
        .collect()
}

/// Render recognized text for the output surface
pub fn format_output(text: &str, mode: OutputMode) -> String {
    match mode {
        OutputMode::Raw => text.to_string(),
        OutputMode::Tokenized => {
            let assignments = tokenize(text);
            let lines: Vec<String> = assignments.iter().map(ToString::to_string).collect();
            for line in &lines {
                debug!(target: "ocr_result", "{}", line);
            }
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_words() {
        assert_eq!(
            format_output("hello world", OutputMode::Tokenized),
            "var1 = hello\nvar2 = world"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(format_output("", OutputMode::Tokenized), "");
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_whitespace_only_input() {
        assert_eq!(format_output(" \t\n  ", OutputMode::Tokenized), "");
    }

    #[test]
    fn test_irregular_spacing() {
        assert_eq!(
            format_output("  foo   bar ", OutputMode::Tokenized),
            "var1 = foo\nvar2 = bar"
        );
    }

    #[test]
    fn test_symbols_are_tokens() {
        assert_eq!(
            format_output("x = 5", OutputMode::Tokenized),
            "var1 = x\nvar2 = =\nvar3 = 5"
        );
    }

    #[test]
    fn test_newlines_and_tabs_split() {
        let tokens = tokenize("a\nb\tc\r\n  d");
        let words: Vec<&str> = tokens.iter().map(|t| t.word.as_str()).collect();
        assert_eq!(words, vec!["a", "b", "c", "d"]);
        assert_eq!(tokens.last().map(|t| t.index), Some(4));
    }

    #[test]
    fn test_raw_mode_is_identity() {
        for input in ["", "hello world", "line one\nline two\n", "  spaced\t"] {
            assert_eq!(format_output(input, OutputMode::Raw), input);
        }
    }

    #[test]
    fn test_output_mode_serde_names() {
        assert_eq!(serde_json::to_string(&OutputMode::Tokenized).unwrap(), "\"tokenized\"");
        assert_eq!(serde_json::from_str::<OutputMode>("\"raw\"").unwrap(), OutputMode::Raw);
    }
}
