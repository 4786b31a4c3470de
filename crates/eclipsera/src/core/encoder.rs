//! Encode and reference-decode entry points.
//!
//! Covers of any supported format are decoded to RGBA8, optionally shrunk to
//! a size budget, receive the payload through the LSB codec and are written
//! out as PNG. The decode functions are the authoritative counterpart of the
//! encoder and need to know the plane and compression flag in advance.

use crate::core::config::EncodeOptions;
use crate::stego::{self, PlaneSelection};
use crate::types::EncodeOutcome;
use crate::{EclipseraError, Result};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::io::Cursor;

/// Embed `text` into `cover`.
///
/// # Errors
///
/// - `Validation` for an empty cover, empty text or an undecodable cover
/// - `CapacityExceeded` when the payload does not fit the selected plane
///
/// Text with a NUL character is still embedded, with a warning: without
/// compression the first NUL terminates the recovered text.
#[tracing::instrument(skip(cover, text, options), fields(cover.size_bytes = cover.len(), text.len = text.len()))]
pub fn encode_text_to_image(cover: &[u8], text: &str, options: &EncodeOptions) -> Result<EncodeOutcome> {
    if text.is_empty() {
        return Err(EclipseraError::validation("No text supplied for embedding."));
    }
    if let Some(position) = text.find('\0') {
        tracing::warn!(
            "Text contains a NUL character at byte {}; uncompressed extraction stops there",
            position
        );
    }
    encode_payload(cover, text.as_bytes(), options)
}

/// Embed an arbitrary byte payload into `cover`.
///
/// The payload must not contain zero bytes unless `options.compress` is set,
/// because the first zero byte ends an uncompressed payload on extraction.
pub fn encode_bytes_to_image(cover: &[u8], payload: &[u8], options: &EncodeOptions) -> Result<EncodeOutcome> {
    if payload.is_empty() {
        return Err(EclipseraError::validation("No payload supplied for embedding."));
    }
    encode_payload(cover, payload, options)
}

fn encode_payload(cover: &[u8], payload: &[u8], options: &EncodeOptions) -> Result<EncodeOutcome> {
    let mut image = load_rgba(cover)?;

    if options.reduce_size {
        image = reduce_to_size_limit(image, options.size_limit_bytes)?;
    }

    let channels = options.channels.as_deref().unwrap_or_default();
    let plane = stego::resolve_plane(options.use_all_channels, channels);
    let stats = stego::embed_payload(&mut image, payload, &plane, options.compress)?;

    tracing::debug!(
        "Embedded {} bytes into plane {} ({} of {} bits)",
        stats.payload_bytes,
        plane,
        stats.bits_written,
        stats.capacity_bits
    );

    let image_bytes = encode_png(&image)?;

    Ok(EncodeOutcome {
        filename: options.output_basename.clone(),
        image_bytes,
        capacity_bytes: stego::capacity_bytes(image.width(), image.height(), &plane),
        width: image.width(),
        height: image.height(),
        plane,
        payload_bytes: stats.payload_bytes,
        options_applied: options.clone(),
    })
}

/// Recover text embedded with the given plane and compression flag.
///
/// Returns `Ok(None)` when `decompress` is set and no prefix of the stream
/// inflates.
pub fn decode_text_from_image(image_bytes: &[u8], plane: &PlaneSelection, decompress: bool) -> Result<Option<String>> {
    let image = load_rgba(image_bytes)?;
    Ok(stego::extract_text(&image, plane, decompress))
}

/// Byte counterpart of [`decode_text_from_image`].
pub fn decode_bytes_from_image(image_bytes: &[u8], plane: &PlaneSelection, decompress: bool) -> Result<Option<Vec<u8>>> {
    let image = load_rgba(image_bytes)?;
    Ok(stego::extract_payload(&image, plane, decompress))
}

/// Largest payload in bytes `cover` can carry in `plane`, before any size
/// reduction.
pub fn capacity_for_image(cover: &[u8], plane: &PlaneSelection) -> Result<u64> {
    let image = load_rgba(cover)?;
    Ok(stego::capacity_bytes(image.width(), image.height(), plane))
}

/// Decode any supported image into an RGBA8 buffer.
pub fn load_rgba(bytes: &[u8]) -> Result<RgbaImage> {
    if bytes.is_empty() {
        return Err(EclipseraError::validation("A cover image is required."));
    }

    image::load_from_memory(bytes)
        .map(|decoded| decoded.to_rgba8())
        .map_err(|e| EclipseraError::validation_with_source("Image could not be decoded", e))
}

/// Encode an RGBA8 buffer as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Halve the image's dimensions until its PNG encoding fits `limit` bytes.
///
/// Stops once either dimension would drop below one pixel.
fn reduce_to_size_limit(mut image: RgbaImage, limit: u64) -> Result<RgbaImage> {
    loop {
        let encoded_len = encode_png(&image)?.len() as u64;
        if encoded_len <= limit {
            return Ok(image);
        }

        let (width, height) = (image.width() / 2, image.height() / 2);
        if width == 0 || height == 0 {
            tracing::warn!(
                "Cover still {} bytes after size reduction, limit is {}",
                encoded_len,
                limit
            );
            return Ok(image);
        }

        tracing::debug!(
            "Cover encodes to {} bytes (limit {}), resizing to {}x{}",
            encoded_len,
            limit,
            width,
            height
        );
        image = imageops::resize(&image, width, height, FilterType::CatmullRom);
    }
}
