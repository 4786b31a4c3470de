//! Payload bitstream layout.
//!
//! The stream is the payload bytes, most significant bit first, followed by
//! eight zero bits. Optional zlib compression is applied to the payload before
//! it is laid out.

use crate::error::{EclipseraError, Result};
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::Write;

/// Number of zero bits appended after the payload.
pub const TERMINATOR_BITS: usize = 8;

/// Bits of a single byte, MSB first.
pub fn byte_bits(byte: u8) -> impl Iterator<Item = bool> {
    (0..8).rev().map(move |shift| (byte >> shift) & 1 == 1)
}

/// Full bitstream for `payload`: MSB-first payload bits then the terminator.
pub fn payload_bits(payload: &[u8]) -> impl Iterator<Item = bool> + '_ {
    payload
        .iter()
        .flat_map(|&byte| byte_bits(byte))
        .chain(std::iter::repeat_n(false, TERMINATOR_BITS))
}

/// Number of bits `payload_bits` yields for a payload of `len` bytes.
pub fn stream_len_bits(len: usize) -> u64 {
    len as u64 * 8 + TERMINATOR_BITS as u64
}

/// Accumulates bits MSB first into whole bytes.
#[derive(Debug, Default)]
pub struct ByteAccumulator {
    current: u8,
    filled: u8,
}

impl ByteAccumulator {
    /// Push one bit; returns the completed byte after every eighth bit.
    pub fn push(&mut self, bit: bool) -> Option<u8> {
        self.current = (self.current << 1) | u8::from(bit);
        self.filled += 1;
        if self.filled == 8 {
            let byte = self.current;
            self.current = 0;
            self.filled = 0;
            Some(byte)
        } else {
            None
        }
    }
}

/// zlib-compress a payload with the default level.
pub fn compress(payload: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(payload.len() / 2 + 16), Compression::default());
    encoder.write_all(payload)?;
    Ok(encoder.finish()?)
}

/// Inflate a complete zlib stream.
///
/// Input that ends before the stream's end marker is rejected, so a prefix of
/// a valid stream never passes as a payload.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).max(64));

    loop {
        let (before_in, before_out) = (inflater.total_in(), inflater.total_out());
        let consumed = before_in as usize;
        let status = inflater
            .decompress_vec(&data[consumed..], &mut out, FlushDecompress::Finish)
            .map_err(|e| EclipseraError::validation_with_source("Payload is not a valid zlib stream", e))?;

        if status == Status::StreamEnd {
            return Ok(out);
        }

        if out.len() == out.capacity() {
            out.reserve(out.capacity().max(64));
            continue;
        }

        if inflater.total_in() == before_in && inflater.total_out() == before_out {
            return Err(EclipseraError::validation("Payload is not a complete zlib stream"));
        }
    }
}
