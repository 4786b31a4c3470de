//! LSB embedding and extraction over RGBA pixel buffers.
//!
//! Pixels are walked in raster order (row by row, left to right). Within a
//! pixel the selected channels are visited in canonical order and each one
//! carries exactly one bit in its least significant position.

use crate::error::{EclipseraError, Result};
use crate::stego::bitstream::{self, ByteAccumulator};
use crate::stego::channel::{Channel, PlaneSelection};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// What an embed pass wrote into the cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedStats {
    /// Bytes laid out, after optional compression.
    pub payload_bytes: usize,
    /// Bits written, terminator included.
    pub bits_written: u64,
    pub capacity_bits: u64,
}

/// Number of bits the plane can carry: one per pixel and selected channel.
pub fn capacity_bits(width: u32, height: u32, plane: &PlaneSelection) -> u64 {
    u64::from(width) * u64::from(height) * plane.len() as u64
}

/// Largest payload in bytes that still leaves room for the terminator.
pub fn capacity_bytes(width: u32, height: u32, plane: &PlaneSelection) -> u64 {
    (capacity_bits(width, height, plane) / 8).saturating_sub(1)
}

/// Write `payload` into the least significant bits of `image`.
///
/// Fails with [`EclipseraError::CapacityExceeded`] before touching any pixel
/// when the stream does not fit. Pixels past the end of the stream are left
/// untouched, as are all channels outside `plane`.
pub fn embed_payload(image: &mut RgbaImage, payload: &[u8], plane: &PlaneSelection, compress: bool) -> Result<EmbedStats> {
    let data: Cow<'_, [u8]> = if compress {
        Cow::Owned(bitstream::compress(payload)?)
    } else {
        Cow::Borrowed(payload)
    };

    let required_bits = bitstream::stream_len_bits(data.len());
    let available_bits = capacity_bits(image.width(), image.height(), plane);
    if required_bits > available_bits {
        return Err(EclipseraError::CapacityExceeded {
            required_bits,
            available_bits,
        });
    }

    let mut bits = bitstream::payload_bits(&data);
    'pixels: for pixel in image.pixels_mut() {
        for channel in plane.iter() {
            let Some(bit) = bits.next() else {
                break 'pixels;
            };
            let value = &mut pixel.0[channel.index()];
            *value = (*value & !1) | u8::from(bit);
        }
    }

    Ok(EmbedStats {
        payload_bytes: data.len(),
        bits_written: required_bits,
        capacity_bits: available_bits,
    })
}

/// Embed UTF-8 text. See [`embed_payload`].
pub fn embed_text(image: &mut RgbaImage, text: &str, plane: &PlaneSelection, compress: bool) -> Result<EmbedStats> {
    embed_payload(image, text.as_bytes(), plane, compress)
}

fn channel_bits<'a>(image: &'a RgbaImage, channels: &'a [Channel], bit: u8) -> impl Iterator<Item = bool> + 'a {
    image
        .pixels()
        .flat_map(move |pixel| channels.iter().map(move |channel| (pixel.0[channel.index()] >> bit) & 1 == 1))
}

/// Every complete byte formed by bit `bit` of `channels`, in stream order.
///
/// No terminator handling; trailing bits that do not fill a byte are dropped.
pub fn read_bit_stream(image: &RgbaImage, channels: &[Channel], bit: u8) -> Vec<u8> {
    let mut acc = ByteAccumulator::default();
    channel_bits(image, channels, bit.min(7))
        .filter_map(|bit| acc.push(bit))
        .collect()
}

/// Recover the payload laid out by [`embed_payload`].
///
/// The first all-zero byte ends the payload. Without a terminator the whole
/// stream is returned. With `decompress`, a zero byte only terminates once the
/// bytes before it inflate as a complete zlib stream, since deflate output may
/// itself contain zero bytes; `None` means no prefix inflated.
pub fn extract_payload(image: &RgbaImage, plane: &PlaneSelection, decompress: bool) -> Option<Vec<u8>> {
    let mut acc = ByteAccumulator::default();
    let mut bytes = Vec::new();

    for bit in channel_bits(image, plane.channels(), 0) {
        let Some(byte) = acc.push(bit) else {
            continue;
        };

        if byte == 0 {
            if !decompress {
                return Some(bytes);
            }
            if let Ok(inflated) = bitstream::decompress(&bytes) {
                return Some(inflated);
            }
        }
        bytes.push(byte);
    }

    if decompress {
        bitstream::decompress(&bytes).ok()
    } else {
        Some(bytes)
    }
}

/// Recover an embedded text payload, decoding it as lossy UTF-8.
pub fn extract_text(image: &RgbaImage, plane: &PlaneSelection, decompress: bool) -> Option<String> {
    extract_payload(image, plane, decompress).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}
