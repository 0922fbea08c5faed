//! Region validation and large-region grouping.

use tracing::warn;

use crate::error::{LayoutError, OrderViolation};
use crate::types::{LargeRegion, MappedRegion};

/// Check that regions are page aligned, non-empty, sorted, non-overlapping
/// and carry one use count and one flag word per page.
///
/// No repair is attempted: the first violation is returned as is.
pub fn validate_regions(regions: &[MappedRegion], page_size: u64) -> Result<(), LayoutError> {
    for (index, region) in regions.iter().enumerate() {
        let violation = if region.end < region.start {
            Some(OrderViolation::Inverted)
        } else if region.start.checked_rem(page_size) != Some(0)
            || region.end.checked_rem(page_size) != Some(0)
        {
            Some(OrderViolation::Misaligned)
        } else if region.end == region.start {
            Some(OrderViolation::Empty)
        } else if index > 0 && region.start < regions[index - 1].start {
            Some(OrderViolation::Unsorted)
        } else if index > 0 && region.start < regions[index - 1].end {
            Some(OrderViolation::Overlapping)
        } else {
            None
        };

        if let Some(kind) = violation {
            warn!(
                index,
                "region order violation at {:#x}..{:#x}: {kind}",
                region.start, region.end
            );
            return Err(LayoutError::RegionOrderViolation {
                index,
                start: region.start,
                end: region.end,
                kind,
            });
        }

        let expected = region.page_count(page_size);
        if region.use_counts.len() as u64 != expected || region.combined_flags.len() as u64 != expected {
            return Err(LayoutError::PageCountMismatch {
                index,
                expected,
                use_counts: region.use_counts.len(),
                flags: region.combined_flags.len(),
            });
        }
    }
    Ok(())
}

/// Group consecutive regions whose gaps are at most `max_gap_bytes`.
///
/// Expects a validated list. Every region belongs to exactly one group and
/// groups are returned in address order.
pub fn group_large_regions(regions: &[MappedRegion], max_gap_bytes: u64) -> Vec<LargeRegion> {
    let Some(first) = regions.first() else {
        return Vec::new();
    };

    let mut groups = Vec::new();
    let mut current = LargeRegion {
        first: first.start,
        last: first.end,
        regions: 0..1,
    };

    for (i, region) in regions.iter().enumerate().skip(1) {
        if region.start > current.last.saturating_add(max_gap_bytes) {
            let next = LargeRegion {
                first: region.start,
                last: region.end,
                regions: i..i + 1,
            };
            groups.push(std::mem::replace(&mut current, next));
        } else {
            current.last = region.end;
            current.regions.end = i + 1;
        }
    }
    groups.push(current);

    groups
}
