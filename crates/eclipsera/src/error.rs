//! Error types for Eclipsera.
//!
//! Every fallible operation in the library returns [`EclipseraError`]. The split
//! mirrors how failures propagate through an analysis run:
//!
//! - `Io` errors always bubble up unchanged. They indicate a real system
//!   problem (disk full, permission denied) that the caller has to see.
//! - `Validation` and `CapacityExceeded` reject malformed top-level input and
//!   abort the run.
//! - `MissingDependency`, `Collaborator` and `Timeout` are produced by external
//!   forensic tools. The orchestrator converts them into per-tool status
//!   entries, so they never abort an analysis.
//!
//! # Example
//!
//! ```rust
//! use eclipsera::{EclipseraError, Result};
//!
//! fn require_text(text: &str) -> Result<&str> {
//!     if text.is_empty() {
//!         return Err(EclipseraError::validation("No text supplied for embedding."));
//!     }
//!     Ok(text)
//! }
//!
//! assert!(require_text("").is_err());
//! ```
use thiserror::Error;

/// Result type alias using `EclipseraError`.
pub type Result<T> = std::result::Result<T, EclipseraError>;

/// Main error type for all Eclipsera operations.
#[derive(Debug, Error)]
pub enum EclipseraError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The payload (plus terminator) does not fit into the selected plane.
    #[error("Payload needs {required_bits} bits but the selected plane only holds {available_bits}")]
    CapacityExceeded { required_bits: u64, available_bits: u64 },

    #[error("Image processing error: {message}")]
    ImageProcessing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Collaborator '{name}' failed: {message}")]
    Collaborator { name: String, message: String },

    #[error("'{name}' timed out after {seconds} seconds")]
    Timeout { name: String, seconds: u64 },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for EclipseraError {
    fn from(err: serde_json::Error) -> Self {
        EclipseraError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<image::ImageError> for EclipseraError {
    fn from(err: image::ImageError) -> Self {
        EclipseraError::ImageProcessing {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<zip::result::ZipError> for EclipseraError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => EclipseraError::Io(io),
            other => EclipseraError::Other(format!("Failed to build artifact archive: {}", other)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl EclipseraError {
    error_constructor!(validation, Validation);
    error_constructor!(image_processing, ImageProcessing);
    error_constructor!(serialization, Serialization);

    /// Create a collaborator failure for the named tool.
    pub fn collaborator<N: Into<String>, S: Into<String>>(name: N, message: S) -> Self {
        Self::Collaborator {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EclipseraError = io_err.into();
        assert!(matches!(err, EclipseraError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_validation_error() {
        let err = EclipseraError::validation("empty cover");
        assert_eq!(err.to_string(), "Validation error: empty cover");
    }

    #[test]
    fn test_validation_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidInput, "bad param");
        let err = EclipseraError::validation_with_source("unreadable cover", source);
        assert_eq!(err.to_string(), "Validation error: unreadable cover");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_capacity_exceeded_message() {
        let err = EclipseraError::CapacityExceeded {
            required_bits: 336,
            available_bits: 12,
        };
        assert_eq!(
            err.to_string(),
            "Payload needs 336 bits but the selected plane only holds 12"
        );
    }

    #[test]
    fn test_image_processing_error_with_source() {
        let source = std::io::Error::other("png encoder failed");
        let err = EclipseraError::image_processing_with_source("resize failed", source);
        assert_eq!(err.to_string(), "Image processing error: resize failed");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_missing_dependency_error() {
        let err = EclipseraError::MissingDependency("zsteg not found".to_string());
        assert_eq!(err.to_string(), "Missing dependency: zsteg not found");
    }

    #[test]
    fn test_collaborator_error() {
        let err = EclipseraError::collaborator("binwalk", "exit status 3");
        assert_eq!(err.to_string(), "Collaborator 'binwalk' failed: exit status 3");
    }

    #[test]
    fn test_timeout_error() {
        let err = EclipseraError::Timeout {
            name: "foremost".to_string(),
            seconds: 60,
        };
        assert_eq!(err.to_string(), "'foremost' timed out after 60 seconds");
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: EclipseraError = json_err.into();
        assert!(matches!(err, EclipseraError::Serialization { .. }));
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_image_error_conversion() {
        let image_err = image::load_from_memory(b"not an image").unwrap_err();
        let err: EclipseraError = image_err.into();
        assert!(matches!(err, EclipseraError::ImageProcessing { .. }));
    }

    #[test]
    fn test_io_error_bubbles_unchanged() {
        fn read_file() -> Result<Vec<u8>> {
            Ok(std::fs::read("/nonexistent/cover.png")?)
        }

        let err = read_file().unwrap_err();
        assert!(matches!(err, EclipseraError::Io(_)));
    }
}
