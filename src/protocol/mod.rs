//! Wire protocol: length-prefixed frames of region records.
//!
//! - [`reader`] - bounds-checked little-endian field reads
//! - [`decoder`] - incremental [`StreamDecoder`]
//! - [`encoder`] - producer-side frame encoding

pub mod decoder;
pub mod encoder;
pub mod reader;

pub use decoder::{DecoderState, StreamDecoder};
pub use encoder::{encode_frame, encode_region, encoded_region_len};
pub use reader::ByteReader;

/// Size of the `u64` payload length that starts every frame.
pub const LENGTH_PREFIX_SIZE: usize = 8;
