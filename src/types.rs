//! Core types for memmosaic.
//!
//! These types flow from the wire decoder through the layout pass and into
//! whatever surface paints the tiles. The decoder produces [`MappedRegion`]s,
//! the layout pass derives [`LargeRegion`]s and emits [`Tile`]s.

use std::ops::Range;

// =============================================================================
// Color
// =============================================================================

/// Opaque RGB color with an alpha channel (0-255).
///
/// Integers for exact comparison. Alpha 255 = fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Create a new RGBA color.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    // Standard colors
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const DARK_GREEN: Self = Self::rgb(0, 128, 0);
    pub const DARK_RED: Self = Self::rgb(128, 0, 0);
    pub const DARK_GRAY: Self = Self::rgb(128, 128, 128);
    pub const MAGENTA: Self = Self::rgb(255, 0, 255);
    pub const LIGHT_MAGENTA: Self = Self::rgb(255, 128, 255);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
}

// =============================================================================
// Regions
// =============================================================================

/// A contiguous, page-aligned address range with per-page metadata.
///
/// `use_counts` and `combined_flags` hold one entry per page of `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MappedRegion {
    pub start: u64,
    pub end: u64,
    /// Backing file path, empty for anonymous mappings.
    pub backing_file: String,
    pub use_counts: Vec<u32>,
    pub combined_flags: Vec<u32>,
}

impl MappedRegion {
    /// Number of pages spanned by the address range.
    #[inline]
    pub fn page_count(&self, page_size: u64) -> u64 {
        self.end.saturating_sub(self.start) / page_size
    }
}

/// A run of consecutive [`MappedRegion`]s displayed as one block.
///
/// `first`/`last` are the address bounds of the run; `regions` indexes the
/// constituent regions in the source slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LargeRegion {
    pub first: u64,
    pub last: u64,
    pub regions: Range<usize>,
}

impl LargeRegion {
    /// Pages spanned from `first` to `last`, gaps included.
    #[inline]
    pub fn page_count(&self, page_size: u64) -> u64 {
        (self.last - self.first) / page_size
    }

    /// Grid rows needed for this run at the given width.
    #[inline]
    pub fn row_count(&self, page_size: u64, columns_per_row: u32) -> u64 {
        self.page_count(page_size).div_ceil(columns_per_row as u64)
    }
}

// =============================================================================
// Grid
// =============================================================================

/// A tile position in the grid. `column` is always below the grid width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GridPos {
    pub row: u32,
    pub column: u32,
}

impl GridPos {
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// Classification of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TileColor {
    /// Page not resident ("present" bit clear).
    NotPresent = 0,
    /// File-backed mmap page used by more than one mapping.
    HighReuse = 1,
    /// File-backed mmap page with a single user.
    FileBacked = 2,
    /// Transparent huge page.
    HugePage = 3,
    /// Private page (use count 1).
    Private = 4,
    /// Shared page (use count > 1).
    Shared = 5,
    /// Placeholder page reported with NOPAGE.
    Anomalous = 6,
    /// No rule matched.
    Unclassified = 7,
    /// Unmapped page between two regions of the same large region.
    Gap = 8,
    /// Separator rows between large regions.
    Separator = 9,
}

impl TileColor {
    pub const COUNT: usize = 10;

    pub const ALL: [TileColor; Self::COUNT] = [
        TileColor::NotPresent,
        TileColor::HighReuse,
        TileColor::FileBacked,
        TileColor::HugePage,
        TileColor::Private,
        TileColor::Shared,
        TileColor::Anomalous,
        TileColor::Unclassified,
        TileColor::Gap,
        TileColor::Separator,
    ];

    /// Stable identifier handed to pixel sinks.
    #[inline]
    pub const fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            TileColor::NotPresent => "not present",
            TileColor::HighReuse => "file, shared",
            TileColor::FileBacked => "file",
            TileColor::HugePage => "transparent huge page",
            TileColor::Private => "private",
            TileColor::Shared => "shared",
            TileColor::Anomalous => "no page",
            TileColor::Unclassified => "unclassified",
            TileColor::Gap => "gap",
            TileColor::Separator => "separator",
        }
    }
}

/// One tile assignment produced by the layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub pos: GridPos,
    pub color: TileColor,
}
