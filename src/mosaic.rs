//! Mosaic - decoder, layout and lookup wired together.
//!
//! Feed it byte chunks from a producer (or hand it regions read locally) and
//! it keeps the latest valid layout. Every accepted update is a full
//! recompute; a rejected update leaves the previous layout in place.

use tracing::debug;

use crate::config::MosaicConfig;
use crate::error::{ConfigError, LayoutError, QueryError, Result};
use crate::layout::{MosaicLayout, PageInfo, compute_layout, flags_at_address};
use crate::protocol::StreamDecoder;
use crate::types::{GridPos, MappedRegion};

#[derive(Debug)]
pub struct Mosaic {
    config: MosaicConfig,
    decoder: StreamDecoder,
    regions: Vec<MappedRegion>,
    layout: MosaicLayout,
    updates: u64,
}

impl Mosaic {
    pub fn new(config: MosaicConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            decoder: StreamDecoder::new(config.page_size, config.max_frame_len),
            regions: Vec::new(),
            layout: MosaicLayout::empty(&config),
            updates: 0,
            config,
        })
    }

    /// Feed a chunk from the stream.
    ///
    /// Returns `Ok(true)` when a frame completed and the layout was rebuilt.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<bool> {
        if !self.decoder.add_chunk(chunk)? {
            return Ok(false);
        }
        let layout = compute_layout(self.decoder.regions(), &self.config)?;
        self.regions = self.decoder.regions().to_vec();
        self.install(layout);
        Ok(true)
    }

    /// Replace the region list directly (local source, no wire format).
    pub fn update_regions(&mut self, regions: Vec<MappedRegion>) -> Result<(), LayoutError> {
        let layout = compute_layout(&regions, &self.config)?;
        self.regions = regions;
        self.install(layout);
        Ok(())
    }

    fn install(&mut self, layout: MosaicLayout) {
        self.updates += 1;
        debug!(
            update = self.updates,
            regions = self.regions.len(),
            rows = layout.rows(),
            "mosaic updated"
        );
        self.layout = layout;
    }

    #[inline]
    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    #[inline]
    pub fn regions(&self) -> &[MappedRegion] {
        &self.regions
    }

    #[inline]
    pub fn layout(&self) -> &MosaicLayout {
        &self.layout
    }

    #[inline]
    pub fn decoder(&self) -> &StreamDecoder {
        &self.decoder
    }

    /// Number of accepted updates so far.
    #[inline]
    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn address_from_position(&self, row: u32, column: u32) -> Result<u64, QueryError> {
        self.layout.address_from_position(row, column)
    }

    pub fn position_from_address(&self, addr: u64) -> Result<GridPos, QueryError> {
        self.layout.position_from_address(addr)
    }

    pub fn flags_at_address(&self, addr: u64) -> Result<PageInfo<'_>, QueryError> {
        flags_at_address(&self.regions, addr, self.config.page_size)
    }

    /// Page data for the tile at `(row, column)`.
    ///
    /// Gap tiles resolve to an address but yield [`QueryError::NotMapped`].
    pub fn page_at_position(&self, row: u32, column: u32) -> Result<PageInfo<'_>, QueryError> {
        let addr = self.address_from_position(row, column)?;
        self.flags_at_address(addr)
    }

    /// Tile under a pixel of a surface drawn at `pixels_per_tile`.
    ///
    /// Coordinates left of or above the surface clamp to 0, and the column
    /// clamps to the last grid column (pointer dragged outside the surface).
    pub fn position_at_pixel(&self, x: i32, y: i32) -> GridPos {
        let tile = self.config.pixels_per_tile;
        let row = y.max(0) as u32 / tile;
        let column = (x.max(0) as u32 / tile).min(self.config.columns_per_row - 1);
        GridPos::new(row, column)
    }

    pub fn page_at_pixel(&self, x: i32, y: i32) -> Result<PageInfo<'_>, QueryError> {
        let pos = self.position_at_pixel(x, y);
        self.page_at_position(pos.row, pos.column)
    }
}
