//! Error types for the tideline-tui crate

use std::io;
use thiserror::Error;

/// Result type alias for tideline-tui operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Terminal I/O errors
    #[error("Terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors from the list core (height model, window, configuration)
    #[error("Core error: {0}")]
    Core(#[from] tideline_core::error::Error),

    /// Input stream ended or failed
    #[error("Event processing error: {0}")]
    EventProcessing(String),
}
