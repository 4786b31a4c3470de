//! Image format sniffing and metadata.
//!
//! Formats are identified from magic bytes only, never from file names.
//! Dimensions come from the `image` crate's header reader; an undecodable
//! buffer yields `UNKNOWN` with zero dimensions instead of an error.

use crate::types::ImageMeta;
use image::ImageReader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
pub const JPEG_MAGIC: &[u8] = b"\xff\xd8";
pub const BMP_MAGIC: &[u8] = b"BM";

/// Container format of a cover or suspect image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Bmp,
    Unknown,
}

impl ImageFormat {
    /// Sniff the format from the leading bytes.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(PNG_MAGIC) {
            ImageFormat::Png
        } else if bytes.starts_with(JPEG_MAGIC) {
            ImageFormat::Jpeg
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            ImageFormat::Webp
        } else if bytes.starts_with(BMP_MAGIC) {
            ImageFormat::Bmp
        } else {
            ImageFormat::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Webp => "WEBP",
            ImageFormat::Bmp => "BMP",
            ImageFormat::Unknown => "UNKNOWN",
        }
    }

    /// Lossless bitmap formats keep LSB payloads intact and are the only
    /// covers the selector sweep probes.
    pub fn is_lossless_bitmap(&self) -> bool {
        matches!(self, ImageFormat::Png)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read format, dimensions and size of an image buffer.
pub fn extract_meta(bytes: &[u8]) -> ImageMeta {
    let size_bytes = bytes.len() as u64;
    let dimensions = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_dimensions().ok());

    match dimensions {
        Some((width, height)) => ImageMeta {
            format: ImageFormat::detect(bytes),
            width,
            height,
            size_bytes,
        },
        None => {
            tracing::debug!("Image header could not be decoded, reporting UNKNOWN meta");
            ImageMeta {
                format: ImageFormat::Unknown,
                width: 0,
                height: 0,
                size_bytes,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_detect_magic_bytes() {
        assert_eq!(ImageFormat::detect(&png_bytes(1, 1)), ImageFormat::Png);
        assert_eq!(ImageFormat::detect(b"\xff\xd8\xff\xe0rest"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::detect(b"RIFF\x00\x00\x00\x00WEBPVP8 "), ImageFormat::Webp);
        assert_eq!(ImageFormat::detect(b"BM\x00\x00"), ImageFormat::Bmp);
        assert_eq!(ImageFormat::detect(b"GIF89a"), ImageFormat::Unknown);
        assert_eq!(ImageFormat::detect(b""), ImageFormat::Unknown);
    }

    #[test]
    fn test_detection_ignores_file_name_conventions() {
        assert_eq!(ImageFormat::detect(b"RIFF\x00\x00\x00\x00WAVE"), ImageFormat::Unknown);
    }

    #[test]
    fn test_extract_meta_png() {
        let bytes = png_bytes(7, 3);
        let meta = extract_meta(&bytes);
        assert_eq!(meta.format, ImageFormat::Png);
        assert_eq!((meta.width, meta.height), (7, 3));
        assert_eq!(meta.size_bytes, bytes.len() as u64);
    }

    #[test]
    fn test_extract_meta_garbage() {
        let meta = extract_meta(b"\x89PNG\r\n\x1a\ntruncated");
        assert_eq!(meta.format, ImageFormat::Unknown);
        assert_eq!((meta.width, meta.height), (0, 0));
        assert_eq!(meta.size_bytes, 17);
    }

    #[test]
    fn test_format_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&ImageFormat::Webp).unwrap(), "\"WEBP\"");
    }
}
