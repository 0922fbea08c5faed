//! TileBuffer - dense grid of tile colors.
//!
//! Flat `Vec` storage with row-major indexing: `index = row * width + column`.
//! Cells the layout never painted (the unfinished tail of a large region's
//! last row) stay `None`.

use crate::layout::{MosaicLayout, PixelSink};
use crate::types::TileColor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileBuffer {
    width: u32,
    height: u32,
    cells: Vec<Option<TileColor>>,
}

impl TileBuffer {
    /// Create an unpainted buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    /// Buffer sized to `layout` with every tile painted.
    pub fn from_layout(layout: &MosaicLayout) -> Self {
        let mut buffer = Self::new(layout.columns(), layout.rows());
        layout.paint(&mut buffer);
        buffer
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, row: u32, column: u32) -> usize {
        row as usize * self.width as usize + column as usize
    }

    #[inline]
    pub fn in_bounds(&self, row: u32, column: u32) -> bool {
        column < self.width && row < self.height
    }

    /// Color at a position; `None` if unpainted or out of bounds.
    #[inline]
    pub fn get(&self, row: u32, column: u32) -> Option<TileColor> {
        if self.in_bounds(row, column) {
            self.cells[self.index(row, column)]
        } else {
            None
        }
    }
}

impl PixelSink for TileBuffer {
    fn set_tile(&mut self, row: u32, column: u32, color: TileColor) {
        if self.in_bounds(row, column) {
            let idx = self.index(row, column);
            self.cells[idx] = Some(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MosaicConfig;
    use crate::layout::compute_layout;
    use crate::types::MappedRegion;

    #[test]
    fn test_set_and_get() {
        let mut buffer = TileBuffer::new(4, 2);
        buffer.set_tile(1, 3, TileColor::Shared);
        assert_eq!(buffer.get(1, 3), Some(TileColor::Shared));
        assert_eq!(buffer.get(0, 0), None);
        // Out of bounds writes are ignored
        buffer.set_tile(2, 0, TileColor::Gap);
        buffer.set_tile(0, 4, TileColor::Gap);
        assert_eq!(buffer.get(2, 0), None);
        assert_eq!(buffer.get(0, 4), None);
        assert_eq!(buffer.get(1, 0), None);
    }

    #[test]
    fn test_from_layout_leaves_row_tail_unpainted() {
        let regions = vec![MappedRegion {
            start: 0,
            end: 3 * 0x1000,
            backing_file: String::new(),
            use_counts: vec![1, 1, 2],
            combined_flags: vec![1 << 31; 3],
        }];
        let config = MosaicConfig {
            columns_per_row: 2,
            ..Default::default()
        };
        let layout = compute_layout(&regions, &config).unwrap();
        let buffer = TileBuffer::from_layout(&layout);

        assert_eq!(buffer.width(), 2);
        assert_eq!(buffer.height(), 2);
        assert_eq!(buffer.get(0, 0), Some(TileColor::Private));
        assert_eq!(buffer.get(0, 1), Some(TileColor::Private));
        assert_eq!(buffer.get(1, 0), Some(TileColor::Shared));
        assert_eq!(buffer.get(1, 1), None);
    }
}
