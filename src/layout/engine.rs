//! Mosaic layout pass.
//!
//! # Algorithm
//!
//! 1. **Validate**: regions must be sorted, non-overlapping and non-empty
//! 2. **Group**: merge regions into large regions across small gaps
//! 3. **Size**: `ceil(pages / columns)` rows per large region, plus separators
//! 4. **Paint**: walk pages in row-major order, one tile per page or gap page,
//!    recording each large region's first row in the [`RowIndex`]
//!
//! Every pass is a full recompute over the input; the same regions always
//! produce the same tiles and the same index.

use tracing::{debug, trace, warn};

use super::classify::classify_page;
use super::group::{group_large_regions, validate_regions};
use super::index::{AddressIndex, RowEntry, RowIndex};
use crate::config::MosaicConfig;
use crate::error::{LayoutError, QueryError};
use crate::types::{GridPos, LargeRegion, MappedRegion, Tile, TileColor};

// =============================================================================
// PixelSink
// =============================================================================

/// Receiver of tile assignments. Implemented by whatever paints tiles.
pub trait PixelSink {
    fn set_tile(&mut self, row: u32, column: u32, color: TileColor);
}

impl PixelSink for Vec<Tile> {
    fn set_tile(&mut self, row: u32, column: u32, color: TileColor) {
        self.push(Tile {
            pos: GridPos::new(row, column),
            color,
        });
    }
}

// =============================================================================
// Result
// =============================================================================

/// Output of one layout pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosaicLayout {
    rows: u32,
    columns: u32,
    tiles: Vec<Tile>,
    large_regions: Vec<LargeRegion>,
    index: AddressIndex,
    histogram: [u64; TileColor::COUNT],
    mapped_pages: u64,
}

impl MosaicLayout {
    /// Layout of an empty region list.
    pub fn empty(config: &MosaicConfig) -> Self {
        Self {
            rows: 0,
            columns: config.columns_per_row,
            tiles: Vec::new(),
            large_regions: Vec::new(),
            index: AddressIndex::new(RowIndex::new(), config.columns_per_row, config.page_size),
            histogram: [0; TileColor::COUNT],
            mapped_pages: 0,
        }
    }

    /// Grid height in tiles.
    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Grid width in tiles.
    #[inline]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Tile assignments in paint order (row-major).
    #[inline]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    #[inline]
    pub fn large_regions(&self) -> &[LargeRegion] {
        &self.large_regions
    }

    #[inline]
    pub fn index(&self) -> &AddressIndex {
        &self.index
    }

    #[inline]
    pub fn row_index(&self) -> &RowIndex {
        self.index.row_index()
    }

    /// Tile count per color, indexed by [`TileColor::id`].
    #[inline]
    pub fn histogram(&self) -> &[u64; TileColor::COUNT] {
        &self.histogram
    }

    #[inline]
    pub fn count(&self, color: TileColor) -> u64 {
        self.histogram[color.id() as usize]
    }

    /// Pages covered by regions (gaps excluded).
    #[inline]
    pub fn mapped_pages(&self) -> u64 {
        self.mapped_pages
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Replay every tile into `sink`.
    pub fn paint<S: PixelSink + ?Sized>(&self, sink: &mut S) {
        for tile in &self.tiles {
            sink.set_tile(tile.pos.row, tile.pos.column, tile.color);
        }
    }

    pub fn address_from_position(&self, row: u32, column: u32) -> Result<u64, QueryError> {
        self.index.address_from_position(row, column)
    }

    pub fn position_from_address(&self, addr: u64) -> Result<GridPos, QueryError> {
        self.index.position_from_address(addr)
    }
}

// =============================================================================
// Paint cursor
// =============================================================================

/// Row-major write position that wraps at the grid width.
struct TileCursor {
    row: u32,
    column: u32,
    columns: u32,
    tiles: Vec<Tile>,
    histogram: [u64; TileColor::COUNT],
}

impl TileCursor {
    fn new(columns: u32, capacity: usize) -> Self {
        Self {
            row: 0,
            column: 0,
            columns,
            tiles: Vec::with_capacity(capacity),
            histogram: [0; TileColor::COUNT],
        }
    }

    #[inline]
    fn emit(&mut self, color: TileColor) {
        self.tiles.set_tile(self.row, self.column, color);
        self.histogram[color.id() as usize] += 1;
        self.column += 1;
        if self.column == self.columns {
            self.column = 0;
            self.row += 1;
        }
    }

    fn emit_run(&mut self, color: TileColor, count: u64) {
        for _ in 0..count {
            self.emit(color);
        }
    }

    /// Move to the start of the next row unless already there.
    fn finish_row(&mut self) {
        if self.column != 0 {
            self.column = 0;
            self.row += 1;
        }
    }
}

// =============================================================================
// Entry point
// =============================================================================

/// Grid height for the given large regions.
pub fn grid_rows(large_regions: &[LargeRegion], config: &MosaicConfig) -> u64 {
    let content: u64 = large_regions
        .iter()
        .map(|lr| lr.row_count(config.page_size, config.columns_per_row))
        .sum();
    let separators = large_regions.len().saturating_sub(1) as u64 * config.separator_rows as u64;
    content + separators
}

/// Lay out `regions` as a tile grid.
///
/// Invalid input is rejected before anything is painted.
pub fn compute_layout(
    regions: &[MappedRegion],
    config: &MosaicConfig,
) -> Result<MosaicLayout, LayoutError> {
    validate_regions(regions, config.page_size)?;

    if regions.is_empty() {
        return Ok(MosaicLayout::empty(config));
    }

    let page_size = config.page_size;
    let large_regions = group_large_regions(regions, config.max_gap_bytes());

    let total_rows = grid_rows(&large_regions, config);
    let rows = u32::try_from(total_rows).map_err(|_| LayoutError::GridTooLarge { rows: total_rows })?;

    let span_pages: u64 = large_regions.iter().map(|lr| lr.page_count(page_size)).sum();
    let separator_tiles = large_regions.len().saturating_sub(1) as u64
        * config.separator_rows as u64
        * config.columns_per_row as u64;
    let mut cursor = TileCursor::new(
        config.columns_per_row,
        usize::try_from(span_pages + separator_tiles).unwrap_or(0),
    );
    let mut row_index = RowIndex::new();
    let mut mapped_pages = 0u64;

    for (n, large) in large_regions.iter().enumerate() {
        debug_assert_eq!(cursor.column, 0);
        row_index.push(RowEntry {
            first_row: cursor.row,
            base: large.first,
            end: large.last,
        });

        for i in large.regions.clone() {
            let region = &regions[i];
            if i > large.regions.start {
                let gap_pages = (region.start - regions[i - 1].end) / page_size;
                cursor.emit_run(TileColor::Gap, gap_pages);
            }

            for (page, (&flags, &use_count)) in
                region.combined_flags.iter().zip(&region.use_counts).enumerate()
            {
                let color = classify_page(flags, use_count);
                if color == TileColor::Unclassified {
                    trace!(
                        address = region.start + page as u64 * page_size,
                        use_count,
                        flags = %crate::flags::printable_page_flags(flags),
                        "unclassified page"
                    );
                }
                cursor.emit(color);
            }
            mapped_pages += region.use_counts.len() as u64;
        }

        // The last row of a large region is left incomplete.
        cursor.finish_row();

        if n + 1 < large_regions.len() {
            for _ in 0..config.separator_rows {
                cursor.emit_run(TileColor::Separator, config.columns_per_row as u64);
            }
        }
    }

    debug_assert_eq!(cursor.row, rows);

    let unclassified = cursor.histogram[TileColor::Unclassified.id() as usize];
    if unclassified > 0 {
        warn!(unclassified, "pages matched no classification rule");
    }
    debug!(
        regions = regions.len(),
        large_regions = large_regions.len(),
        rows,
        tiles = cursor.tiles.len(),
        "layout pass complete"
    );

    Ok(MosaicLayout {
        rows,
        columns: config.columns_per_row,
        tiles: cursor.tiles,
        large_regions,
        index: AddressIndex::new(row_index, config.columns_per_row, page_size),
        histogram: cursor.histogram,
        mapped_pages,
    })
}
