//! Error types for work order extraction and redaction.
//!
//! Errors are split by how callers are expected to react: validation
//! failures are reported before any processing, structural failures abort an
//! extraction, and backend/IO failures propagate as processing failures.
//! Missing or malformed *data* is not an error at all; see
//! [`Degradation`](crate::domain::Degradation).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for extraction and redaction operations.
pub type RedactorResult<T> = Result<T, RedactorError>;

/// Error type for all extraction and redaction operations.
#[derive(Debug, Error)]
pub enum RedactorError {
    /// Error occurred while reading or writing files
    #[error("IO error for path '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Caller supplied something we refuse to process
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Error occurred during PDF processing
    #[error("PDF processing error{}: {message}", .page.map(|p| format!(" on page {}", p)).unwrap_or_default())]
    PdfProcessing {
        message: String,
        page: Option<usize>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A line-item row lacks one of the columns the work order form guarantees
    #[error("Line item table is missing column '{column}' (row {row})")]
    MissingColumn { column: String, row: usize },

    /// Text extraction failed
    #[error("Text extraction failed for '{}': {reason}", .path.display())]
    TextExtraction { path: PathBuf, reason: String },

    /// Backend-specific error (MuPDF, pdf-extract, etc.)
    #[error("{backend} backend error: {message}")]
    BackendError {
        backend: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RedactorError {
    /// Shorthand for a MuPDF failure with its source attached.
    pub(crate) fn mupdf(message: impl Into<String>, source: mupdf::Error) -> Self {
        Self::BackendError {
            backend: "MuPDF".to_string(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true for errors caused by the caller's input rather than by processing.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

impl From<io::Error> for RedactorError {
    fn from(err: io::Error) -> Self {
        Self::BackendError {
            backend: "std::io".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
