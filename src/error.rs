//! Import-path errors.
//!
//! Extraction itself is total and fails into emptiness; the only hard
//! failures are document decoding and losing the worker task.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Document contains no text")]
    Empty,

    #[error("Document decoding failed: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Document processing failed: {0}")]
    Document(#[from] DocumentError),

    #[error("Import worker failed: {0}")]
    Worker(String),
}
