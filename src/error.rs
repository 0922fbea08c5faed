//! Error types.
//!
//! Waiting for more bytes is not an error: the decoder reports it as
//! `Ok(false)`. Query misses (`OutOfRange`, `NotMapped`) are ordinary
//! "no data here" answers and callers are expected to match on them.

use std::path::PathBuf;

/// Fatal problems with a single wire frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Payload ends mid-record or a record's declared lengths overrun it.
    #[error("malformed record at payload offset {offset}: {reason}")]
    MalformedRecord { offset: usize, reason: String },

    /// Declared payload length exceeds the configured maximum.
    #[error("frame payload of {declared} bytes exceeds limit of {limit} bytes")]
    FrameTooLarge { declared: u64, limit: u64 },
}

/// How two neighbouring regions (or one region) break the ordering contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderViolation {
    /// `start == end`.
    Empty,
    /// `start` or `end` not on a page boundary.
    Misaligned,
    /// `end < start`.
    Inverted,
    /// `start` below the previous region's `start`.
    Unsorted,
    /// `start` below the previous region's `end`.
    Overlapping,
}

impl std::fmt::Display for OrderViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderViolation::Empty => "empty region",
            OrderViolation::Misaligned => "bounds not page aligned",
            OrderViolation::Inverted => "end before start",
            OrderViolation::Unsorted => "regions not sorted",
            OrderViolation::Overlapping => "regions overlap",
        };
        f.write_str(s)
    }
}

/// The region list cannot be laid out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("region order violation at index {index} ({start:#x}..{end:#x}): {kind}")]
    RegionOrderViolation {
        index: usize,
        start: u64,
        end: u64,
        kind: OrderViolation,
    },

    /// Per-page arrays disagree with the address range.
    #[error("region {index} spans {expected} pages but carries {use_counts} use counts and {flags} flag words")]
    PageCountMismatch {
        index: usize,
        expected: u64,
        use_counts: usize,
        flags: usize,
    },

    #[error("layout needs {rows} rows, more than the grid can address")]
    GridTooLarge { rows: u64 },
}

/// No data for the queried position or address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("grid position is outside every laid-out region")]
    OutOfRange,
    #[error("address {0:#x} is not mapped")]
    NotMapped(u64),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Anything that can go wrong while updating a [`crate::Mosaic`].
#[derive(Debug, thiserror::Error)]
pub enum MosaicError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = MosaicError> = std::result::Result<T, E>;
