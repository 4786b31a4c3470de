//! Eclipsera - LSB text steganography and hidden payload analysis
//!
//! Eclipsera hides a text payload in the least significant bits of an image's
//! colour channels, and analyses suspect images by combining a bit-plane
//! selector sweep with a roster of forensic collaborators (binwalk, exiftool,
//! foremost, zsteg, steghide, outguess, plus in-process plane decomposition
//! and string scanning).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use eclipsera::{EncodeOptions, PlaneSelection, decode_text_from_image, encode_text_to_image};
//!
//! # fn main() -> eclipsera::Result<()> {
//! let cover = std::fs::read("cover.png")?;
//! let outcome = encode_text_to_image(&cover, "hello, moon.", &EncodeOptions::default())?;
//!
//! let recovered = decode_text_from_image(&outcome.image_bytes, &outcome.plane, false)?;
//! assert_eq!(recovered.as_deref(), Some("hello, moon."));
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Codec** (`stego`): channel selection, bit layout, terminator, zlib
//! - **Sweep** (`sweep`): fixed bit-plane probes via zsteg and in-process
//! - **Collaborators** (`collaborators`): external tools run concurrently,
//!   each reporting into a shared results store
//! - **Aggregation** (`aggregate`, `report`): dedupe, rank, assemble
//! - **Core** (`core`): entry points, configuration, workspaces

#![deny(unsafe_code)]

pub mod aggregate;
pub mod collaborators;
pub mod core;
pub mod error;
pub mod report;
pub mod stego;
pub mod sweep;
pub mod types;

pub use error::{EclipseraError, Result};

pub use core::{
    AnalyzeConfig, AnalyzeOptions, EclipseraConfig, EncodeOptions, ImageFormat, ToolPaths, analyze_image,
    analyze_image_sync, capacity_for_image, decode_bytes_from_image, decode_text_from_image, encode_bytes_to_image,
    encode_text_to_image,
};
pub use stego::{Channel, PlaneSelection, resolve_plane};
pub use types::{
    AggregatedReport, AnalyzerDetail, AnalyzerStatus, Artifact, Candidate, EncodeOutcome, ImageMeta, PlaneImage,
    SelectorHit, ToolReport,
};
