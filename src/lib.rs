//! # memmosaic
//!
//! Per-page memory mosaic of a running process.
//!
//! A producer streams address-range records (per-page use counts and kernel
//! page flags). memmosaic decodes the stream incrementally, lays the pages out
//! as a fixed-width grid of classified tiles and answers which address a tile
//! stands for, and which tile an address lands on.
//!
//! ## Pipeline
//!
//! ```text
//! bytes → StreamDecoder → [MappedRegion] → compute_layout → MosaicLayout
//!                                                            ├─ tiles → PixelSink
//!                                                            └─ AddressIndex → queries
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Regions, grid positions, tile colors
//! - [`flags`] - Kernel page flag bits and their names
//! - [`protocol`] - Wire format decoder and encoder
//! - [`layout`] - Grouping, classification, paint pass, lookup
//! - [`renderer`] - Tile buffer, palette and terminal output
//! - [`mosaic`] - Everything wired together

pub mod config;
pub mod error;
pub mod flags;
pub mod layout;
pub mod mosaic;
pub mod protocol;
pub mod renderer;
pub mod types;

pub use types::*;

pub use config::MosaicConfig;
pub use error::{ConfigError, DecodeError, LayoutError, MosaicError, OrderViolation, QueryError};
pub use flags::{PageFlags, printable_page_flags};
pub use layout::{
    AddressIndex, MosaicLayout, PageInfo, PixelSink, RowEntry, RowIndex, classify_page,
    compute_layout, flags_at_address,
};
pub use mosaic::Mosaic;
pub use protocol::{StreamDecoder, encode_frame};
pub use renderer::{HalfBlockRenderer, Palette, TileBuffer};
