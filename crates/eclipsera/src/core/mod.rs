//! Entry points and the plumbing around them.
//!
//! - [`encoder`]: embed a payload into a cover, reference decode
//! - [`analyzer`]: multi-source analysis of a suspect image
//! - [`format`]: magic-byte format sniffing and image metadata
//! - [`config`]: encode/analyze configuration and file loading
//! - [`io`]: run workspaces, archives, log persistence
//!
//! # Example
//!
//! ```rust,no_run
//! use eclipsera::core::config::EncodeOptions;
//! use eclipsera::core::encoder::encode_text_to_image;
//!
//! # fn example() -> eclipsera::Result<()> {
//! let cover = std::fs::read("cover.png")?;
//! let outcome = encode_text_to_image(&cover, "hello, moon.", &EncodeOptions::default())?;
//! std::fs::write(&outcome.filename, &outcome.image_bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod encoder;
pub mod format;
pub mod io;

pub use analyzer::{analyze_image, analyze_image_sync};
pub use config::{AnalyzeConfig, AnalyzeOptions, EclipseraConfig, EncodeOptions, ToolPaths};
pub use encoder::{
    capacity_for_image, decode_bytes_from_image, decode_text_from_image, encode_bytes_to_image,
    encode_text_to_image,
};
pub use format::{ImageFormat, extract_meta};
