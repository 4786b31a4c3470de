//! The LSB codec.
//!
//! - [`channel`] - which channels carry payload bits
//! - [`bitstream`] - payload to bit layout, terminator, zlib
//! - [`lsb`] - embedding and extraction over RGBA buffers
//! - [`planes`] - bit plane rendering for visual inspection

pub mod bitstream;
pub mod channel;
pub mod lsb;
pub mod planes;

pub use channel::{Channel, PlaneSelection, resolve_plane};
pub use lsb::{
    EmbedStats, capacity_bits, capacity_bytes, embed_payload, embed_text, extract_payload, extract_text,
    read_bit_stream,
};
