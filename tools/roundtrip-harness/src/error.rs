//! Error types for the round-trip harness

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the harness
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Encoding or analysis failed
    #[error("Eclipsera error: {0}")]
    Eclipsera(#[from] eclipsera::EclipseraError),

    /// Covers directory holds no usable image
    #[error("No cover images found in {0}")]
    NoCovers(PathBuf),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
