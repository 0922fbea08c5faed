//! Layout engine: region grouping, page classification, tile paint pass and
//! position/address lookup.
//!
//! - [`group`] - validation and large-region grouping
//! - [`classify`] - page flags + use count -> [`TileColor`](crate::types::TileColor)
//! - [`engine`] - the paint pass producing a [`MosaicLayout`]
//! - [`index`] - [`RowIndex`] and [`AddressIndex`] queries

pub mod classify;
pub mod engine;
pub mod group;
pub mod index;

pub use classify::classify_page;
pub use engine::{MosaicLayout, PixelSink, compute_layout, grid_rows};
pub use group::{group_large_regions, validate_regions};
pub use index::{AddressIndex, PageInfo, RowEntry, RowIndex, flags_at_address};
