//! Error types for the pdf-pager library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pdf-pager library
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed `-i` value (`path[|title[|parent]]`)
    #[error("Invalid input spec '{spec}': {reason}")]
    InvalidInputSpec { spec: String, reason: String },

    /// Nothing to process
    #[error("No input files provided")]
    NoInputs,

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Input could not be read or output could not be written
    #[error("Cannot access {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unparseable PDF structure
    #[error("Malformed PDF {}: {source}", .path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// Bookmark points past the end of the document
    #[error("Bookmark '{title}' targets page {page} but the document has {page_count} pages")]
    BookmarkTarget {
        title: String,
        page: usize,
        page_count: usize,
    },

    /// Intermediate file could not be removed. Logged, never fatal.
    #[error("Failed to delete intermediate file {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Log file setup failed
    #[error("Failed to initialise logging: {0}")]
    Log(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Build an `InvalidInputSpec` for a raw `-i` value
    pub fn invalid_spec(spec: &str, reason: impl Into<String>) -> Self {
        Error::InvalidInputSpec {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error may be swallowed after a successful run
    pub fn is_cleanup(&self) -> bool {
        matches!(self, Error::Cleanup { .. })
    }
}
