//! Grid position <-> address lookup.
//!
//! The [`RowIndex`] is filled during the paint pass with one entry per large
//! region. Because a large region's span is painted without holes (gaps get
//! gap tiles), an address inside it is a plain offset from the entry's base.

use crate::error::QueryError;
use crate::flags::PageFlags;
use crate::types::{GridPos, MappedRegion};

/// First grid row and address span of one large region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowEntry {
    pub first_row: u32,
    pub base: u64,
    pub end: u64,
}

/// Entries ordered by both `first_row` and `base`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowIndex {
    entries: Vec<RowEntry>,
}

impl RowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: RowEntry) {
        debug_assert!(self.entries.last().is_none_or(|last| {
            last.first_row <= entry.first_row && last.end <= entry.base
        }));
        self.entries.push(entry);
    }

    #[inline]
    pub fn entries(&self) -> &[RowEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Greatest entry whose `first_row <= row`.
    pub fn entry_for_row(&self, row: u32) -> Option<&RowEntry> {
        let idx = self.entries.partition_point(|e| e.first_row <= row);
        idx.checked_sub(1).map(|i| &self.entries[i])
    }

    /// Greatest entry whose `base <= addr`.
    pub fn entry_for_address(&self, addr: u64) -> Option<&RowEntry> {
        let idx = self.entries.partition_point(|e| e.base <= addr);
        idx.checked_sub(1).map(|i| &self.entries[i])
    }
}

/// Forward and reverse lookup over one layout pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressIndex {
    rows: RowIndex,
    columns_per_row: u32,
    page_size: u64,
}

impl AddressIndex {
    pub fn new(rows: RowIndex, columns_per_row: u32, page_size: u64) -> Self {
        Self {
            rows,
            columns_per_row,
            page_size,
        }
    }

    #[inline]
    pub fn row_index(&self) -> &RowIndex {
        &self.rows
    }

    /// Address of the page painted at `(row, column)`.
    ///
    /// Fails with [`QueryError::OutOfRange`] for columns outside the grid,
    /// rows above the first large region, and positions past the end of
    /// their large region (unpainted row tails, separators, rows below the
    /// grid).
    pub fn address_from_position(&self, row: u32, column: u32) -> Result<u64, QueryError> {
        if column >= self.columns_per_row {
            return Err(QueryError::OutOfRange);
        }
        let entry = self.rows.entry_for_row(row).ok_or(QueryError::OutOfRange)?;

        let page = (row - entry.first_row) as u64 * self.columns_per_row as u64 + column as u64;
        let addr = page
            .checked_mul(self.page_size)
            .and_then(|offset| entry.base.checked_add(offset))
            .ok_or(QueryError::OutOfRange)?;

        if addr >= entry.end {
            return Err(QueryError::OutOfRange);
        }
        Ok(addr)
    }

    /// Grid position of the tile covering `addr`.
    ///
    /// Addresses in gaps inside a large region map to their gap tile.
    pub fn position_from_address(&self, addr: u64) -> Result<GridPos, QueryError> {
        let entry = self.rows.entry_for_address(addr).ok_or(QueryError::OutOfRange)?;
        if addr >= entry.end {
            return Err(QueryError::OutOfRange);
        }

        let page = (addr - entry.base) / self.page_size;
        let columns = self.columns_per_row as u64;
        let row = u32::try_from(entry.first_row as u64 + page / columns)
            .map_err(|_| QueryError::OutOfRange)?;
        Ok(GridPos::new(row, (page % columns) as u32))
    }
}

/// Per-page data found at an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo<'a> {
    /// Page-aligned address of the page.
    pub address: u64,
    pub flags: u32,
    pub use_count: u32,
    pub backing_file: &'a str,
}

impl PageInfo<'_> {
    #[inline]
    pub fn page_flags(&self) -> PageFlags {
        PageFlags::from_wire(self.flags)
    }
}

/// Flags, use count and backing file of the page containing `addr`.
///
/// Fails with [`QueryError::NotMapped`] past the last region and in gaps
/// between regions.
pub fn flags_at_address(
    regions: &[MappedRegion],
    addr: u64,
    page_size: u64,
) -> Result<PageInfo<'_>, QueryError> {
    let idx = regions.partition_point(|r| r.end <= addr);
    let region = regions.get(idx).ok_or(QueryError::NotMapped(addr))?;
    if addr < region.start {
        return Err(QueryError::NotMapped(addr));
    }

    let index = ((addr - region.start) / page_size) as usize;
    match (region.combined_flags.get(index), region.use_counts.get(index)) {
        (Some(&flags), Some(&use_count)) => Ok(PageInfo {
            address: region.start + index as u64 * page_size,
            flags,
            use_count,
            backing_file: &region.backing_file,
        }),
        _ => Err(QueryError::NotMapped(addr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: u64 = 0x1000;

    fn index() -> AddressIndex {
        let mut rows = RowIndex::new();
        // 10 pages at 0x10000 (rows 0-2 at 4 columns), then separator rows 3-4
        rows.push(RowEntry {
            first_row: 0,
            base: 0x10000,
            end: 0x10000 + 10 * PAGE,
        });
        rows.push(RowEntry {
            first_row: 5,
            base: 0x100000,
            end: 0x100000 + 4 * PAGE,
        });
        AddressIndex::new(rows, 4, PAGE)
    }

    #[test]
    fn test_address_from_position() {
        let idx = index();
        assert_eq!(idx.address_from_position(0, 0), Ok(0x10000));
        assert_eq!(idx.address_from_position(1, 2), Ok(0x10000 + 6 * PAGE));
        assert_eq!(idx.address_from_position(2, 1), Ok(0x10000 + 9 * PAGE));
        assert_eq!(idx.address_from_position(5, 3), Ok(0x100000 + 3 * PAGE));
    }

    #[test]
    fn test_address_from_position_out_of_range() {
        let idx = index();
        // Unpainted tail of row 2
        assert_eq!(idx.address_from_position(2, 2), Err(QueryError::OutOfRange));
        // Separator
        assert_eq!(idx.address_from_position(3, 0), Err(QueryError::OutOfRange));
        // Below the grid
        assert_eq!(idx.address_from_position(6, 0), Err(QueryError::OutOfRange));
        // Column past the grid width
        assert_eq!(idx.address_from_position(0, 4), Err(QueryError::OutOfRange));
        // Empty index
        let empty = AddressIndex::new(RowIndex::new(), 4, PAGE);
        assert_eq!(empty.address_from_position(0, 0), Err(QueryError::OutOfRange));
    }

    #[test]
    fn test_row_before_first_entry() {
        let mut rows = RowIndex::new();
        rows.push(RowEntry {
            first_row: 2,
            base: 0x1000,
            end: 0x2000,
        });
        let idx = AddressIndex::new(rows, 4, PAGE);
        assert_eq!(idx.address_from_position(1, 0), Err(QueryError::OutOfRange));
        assert_eq!(idx.address_from_position(2, 0), Ok(0x1000));
    }

    #[test]
    fn test_position_from_address() {
        let idx = index();
        assert_eq!(idx.position_from_address(0x10000), Ok(GridPos::new(0, 0)));
        assert_eq!(idx.position_from_address(0x10000 + 6 * PAGE + 12), Ok(GridPos::new(1, 2)));
        assert_eq!(idx.position_from_address(0x100000 + PAGE), Ok(GridPos::new(5, 1)));
        assert_eq!(idx.position_from_address(0xfff), Err(QueryError::OutOfRange));
        assert_eq!(idx.position_from_address(0x10000 + 10 * PAGE), Err(QueryError::OutOfRange));
    }

    fn regions() -> Vec<MappedRegion> {
        vec![
            MappedRegion {
                start: 0x1000,
                end: 0x3000,
                backing_file: "/usr/lib/libm.so".into(),
                use_counts: vec![1, 4],
                combined_flags: vec![0x8000_0000, 0x8000_0800],
            },
            MappedRegion {
                start: 0x5000,
                end: 0x6000,
                backing_file: String::new(),
                use_counts: vec![2],
                combined_flags: vec![0x8000_1000],
            },
        ]
    }

    #[test]
    fn test_flags_at_address() {
        let regions = regions();
        let info = flags_at_address(&regions, 0x2abc, PAGE).unwrap();
        assert_eq!(info.address, 0x2000);
        assert_eq!(info.flags, 0x8000_0800);
        assert_eq!(info.use_count, 4);
        assert_eq!(info.backing_file, "/usr/lib/libm.so");
        assert!(info.page_flags().contains(PageFlags::MMAP));

        let info = flags_at_address(&regions, 0x5000, PAGE).unwrap();
        assert_eq!(info.use_count, 2);
        assert_eq!(info.backing_file, "");
    }

    #[test]
    fn test_flags_at_address_not_mapped() {
        let regions = regions();
        assert_eq!(flags_at_address(&regions, 0x0, PAGE), Err(QueryError::NotMapped(0x0)));
        // Gap between the two regions
        assert_eq!(flags_at_address(&regions, 0x3000, PAGE), Err(QueryError::NotMapped(0x3000)));
        assert_eq!(flags_at_address(&regions, 0x6000, PAGE), Err(QueryError::NotMapped(0x6000)));
        assert_eq!(flags_at_address(&[], 0x1000, PAGE), Err(QueryError::NotMapped(0x1000)));
    }
}
