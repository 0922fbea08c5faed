//! Producer side of the wire format.
//!
//! Used by tests and by tools that record or replay streams. The output is
//! bit-exact with what [`super::StreamDecoder`] expects.

use super::reader::padding_for;
use crate::types::MappedRegion;

/// Append one record to `out`.
///
/// The per-page arrays are written as given; callers are responsible for
/// keeping them at `(end - start) / page_size` entries each.
pub fn encode_region(out: &mut Vec<u8>, region: &MappedRegion) {
    debug_assert_eq!(region.use_counts.len(), region.combined_flags.len());

    let name = region.backing_file.as_bytes();
    out.extend_from_slice(&region.start.to_le_bytes());
    out.extend_from_slice(&region.end.to_le_bytes());
    out.extend_from_slice(&(name.len() as u32).to_le_bytes());
    out.extend_from_slice(name);
    out.resize(out.len() + padding_for(name.len()), 0);

    for count in &region.use_counts {
        out.extend_from_slice(&count.to_le_bytes());
    }
    for flags in &region.combined_flags {
        out.extend_from_slice(&flags.to_le_bytes());
    }
}

/// Size of a record on the wire.
pub fn encoded_region_len(region: &MappedRegion) -> usize {
    let name_len = region.backing_file.len();
    8 + 8 + 4 + name_len + padding_for(name_len) + 4 * (region.use_counts.len() + region.combined_flags.len())
}

/// Encode a complete frame: length prefix followed by every record.
pub fn encode_frame(regions: &[MappedRegion]) -> Vec<u8> {
    let payload_len: usize = regions.iter().map(encoded_region_len).sum();
    let mut out = Vec::with_capacity(8 + payload_len);
    out.extend_from_slice(&(payload_len as u64).to_le_bytes());
    for region in regions {
        encode_region(&mut out, region);
    }
    debug_assert_eq!(out.len(), 8 + payload_len);
    out
}
