//! Error types for the tideline-core crate

use thiserror::Error;

/// Result type alias for tideline-core operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A height lookup or measurement addressed an index outside the sequence.
    #[error("Height index {index} out of range for sequence of length {len}")]
    HeightIndexOutOfRange { index: usize, len: usize },

    /// An offset query with `from > to` or `to` past the end of the sequence.
    #[error("Invalid offset range {from}..{to} for sequence of length {len}")]
    InvalidOffsetRange { from: usize, to: usize, len: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// The history source failed to produce a page.
    #[error("History fetch failed: {0}")]
    HistoryFetch(String),
}
