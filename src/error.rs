//! Error types for trueno-anomaly operations.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or driving a detector.
#[derive(Error, Debug)]
pub enum Error {
    /// Detector parameters rejected at construction; no detector is produced.
    #[error("invalid configuration for '{parameter}': {message}")]
    InvalidConfiguration {
        /// Parameter that failed validation.
        parameter: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// A sample that is not a finite real number.
    ///
    /// The detector is left exactly as it was before the call.
    #[error("invalid input: sample must be finite, got {0}")]
    InvalidInput(f64),

    /// Signal generator parameters out of range.
    #[error("invalid signal parameter '{parameter}': {message}")]
    InvalidSignal {
        /// Parameter that failed validation.
        parameter: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed, 0 if unknown).
        line: usize,
        /// Error message describing the issue.
        message: String,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),

    /// I/O error (display output, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn config(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration { parameter, message: message.into() }
    }

    pub(crate) fn signal(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidSignal { parameter, message: message.into() }
    }

    /// Returns true for errors raised by a single rejected sample.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
