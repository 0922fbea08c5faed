//! Incremental frame decoder.
//!
//! Turns an arbitrarily chunked byte stream into region lists, one complete
//! frame at a time. Bytes are accumulated until the length prefix and the
//! whole payload it announces are buffered; only then is the payload parsed.
//!
//! # Frame layout (little-endian)
//!
//! ```text
//! u64 payload_len
//! payload_len bytes, zero or more records:
//!     u64 start
//!     u64 end
//!     u32 name_len
//!     name_len bytes of name, zero padded to a 4-byte boundary
//!     pages x u32 use counts
//!     pages x u32 combined flags          (pages = (end - start) / page_size)
//! ```

use tracing::{debug, warn};

use super::reader::{ByteReader, padding_for};
use super::LENGTH_PREFIX_SIZE;
use crate::error::DecodeError;
use crate::types::MappedRegion;

// =============================================================================
// State
// =============================================================================

/// Accumulation state between chunks.
#[derive(Debug, Default, Clone)]
pub struct DecoderState {
    /// Bytes received but not yet consumed by a complete frame.
    pub buf: Vec<u8>,
    /// Payload length of the frame being accumulated, once its prefix is in.
    pub pending_len: Option<u64>,
}

enum FrameResult {
    Frame(Vec<MappedRegion>),
    Incomplete,
    /// Bad frame still at the front of the buffer. `skip` is its length, or
    /// `None` when no frame boundary can be recovered.
    Rejected {
        error: DecodeError,
        skip: Option<usize>,
    },
}

// =============================================================================
// Decoder
// =============================================================================

/// Stream decoder owning its buffer and the most recently decoded region list.
#[derive(Debug)]
pub struct StreamDecoder {
    state: DecoderState,
    page_size: u64,
    max_frame_len: u64,
    regions: Vec<MappedRegion>,
    frames_decoded: u64,
}

impl StreamDecoder {
    /// # Panics
    ///
    /// If `page_size` is not a power of two. [`MosaicConfig::validate`]
    /// rejects such sizes up front.
    ///
    /// [`MosaicConfig::validate`]: crate::config::MosaicConfig::validate
    pub fn new(page_size: u64, max_frame_len: u64) -> Self {
        assert!(
            page_size.is_power_of_two(),
            "page size must be a power of two, got {page_size}"
        );
        Self {
            state: DecoderState {
                buf: Vec::with_capacity(64 * 1024),
                pending_len: None,
            },
            page_size,
            max_frame_len,
            regions: Vec::new(),
            frames_decoded: 0,
        }
    }

    /// Feed a chunk of bytes.
    ///
    /// Returns `Ok(true)` if at least one frame completed during this call;
    /// [`regions`](Self::regions) then holds the last of them. Earlier frames
    /// completed in the same call are dropped.
    ///
    /// A bad frame found after a completed one stays buffered and is reported
    /// by the next call. When the error is returned the offending frame is discarded and the
    /// previous region list stays in place. Bytes after the bad frame remain
    /// buffered and are processed by the next call (an empty chunk is enough).
    pub fn add_chunk(&mut self, data: &[u8]) -> Result<bool, DecodeError> {
        self.state.buf.extend_from_slice(data);
        let mut completed = false;

        loop {
            match self.try_take_frame() {
                FrameResult::Frame(regions) => {
                    self.regions = regions;
                    self.frames_decoded += 1;
                    completed = true;
                }
                FrameResult::Incomplete => break,
                FrameResult::Rejected { .. } if completed => break,
                FrameResult::Rejected { error, skip } => {
                    self.discard(skip, &error);
                    return Err(error);
                }
            }
        }

        Ok(completed)
    }

    /// Regions of the most recently completed frame.
    #[inline]
    pub fn regions(&self) -> &[MappedRegion] {
        &self.regions
    }

    /// Whether bytes of an unfinished frame are buffered.
    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.state.buf.is_empty()
    }

    #[inline]
    pub fn buffered_len(&self) -> usize {
        self.state.buf.len()
    }

    #[inline]
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    #[inline]
    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    #[inline]
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Drop buffered bytes and the current region list.
    pub fn reset(&mut self) {
        self.state.buf.clear();
        self.state.pending_len = None;
        self.regions.clear();
    }

    fn try_take_frame(&mut self) -> FrameResult {
        if self.state.pending_len.is_none() && self.state.buf.len() >= LENGTH_PREFIX_SIZE {
            let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
            prefix.copy_from_slice(&self.state.buf[..LENGTH_PREFIX_SIZE]);
            let declared = u64::from_le_bytes(prefix);

            if declared > self.max_frame_len || usize::try_from(declared).is_err() {
                return FrameResult::Rejected {
                    error: DecodeError::FrameTooLarge {
                        declared,
                        limit: self.max_frame_len,
                    },
                    skip: None,
                };
            }
            self.state.pending_len = Some(declared);
        }

        let Some(payload_len) = self.state.pending_len else {
            return FrameResult::Incomplete;
        };
        // Checked against max_frame_len above.
        let frame_len = LENGTH_PREFIX_SIZE + payload_len as usize;
        if self.state.buf.len() < frame_len {
            return FrameResult::Incomplete;
        }

        match parse_payload(&self.state.buf[LENGTH_PREFIX_SIZE..frame_len], self.page_size) {
            Ok(regions) => {
                self.consume(frame_len);
                debug!(payload_len, regions = regions.len(), "decoded frame");
                FrameResult::Frame(regions)
            }
            Err(error) => FrameResult::Rejected {
                error,
                skip: Some(frame_len),
            },
        }
    }

    /// Drop a rejected frame, or the whole buffer if its end is unknown.
    fn discard(&mut self, skip: Option<usize>, error: &DecodeError) {
        match skip {
            Some(frame_len) => {
                warn!(frame_len, error = %error, "discarding malformed frame");
                self.consume(frame_len);
            }
            None => {
                warn!(error = %error, "oversized frame, clearing stream buffer");
                self.state.buf.clear();
                self.state.pending_len = None;
            }
        }
    }

    fn consume(&mut self, n: usize) {
        self.state.buf.drain(..n);
        self.state.pending_len = None;
    }
}

/// Parse one frame payload into its records.
///
/// The payload must end exactly after the last record. `page_size` is a
/// power of two, as [`StreamDecoder::new`] enforces.
pub(crate) fn parse_payload(payload: &[u8], page_size: u64) -> Result<Vec<MappedRegion>, DecodeError> {
    let mut reader = ByteReader::new(payload);
    let mut regions = Vec::new();

    while !reader.is_empty() {
        let record_offset = reader.position();
        let start = reader.read_u64_le("region start")?;
        let end = reader.read_u64_le("region end")?;
        let name_len = reader.read_u32_le("name length")? as usize;
        let name = reader.read_bytes(name_len, "backing file name")?;
        reader.skip(padding_for(name_len), "name padding")?;

        if start % page_size != 0 {
            return Err(DecodeError::MalformedRecord {
                offset: record_offset,
                reason: format!("region start {start:#x} is not page aligned"),
            });
        }
        if end < start {
            return Err(DecodeError::MalformedRecord {
                offset: record_offset,
                reason: format!("region end {end:#x} precedes start {start:#x}"),
            });
        }
        if (end - start) % page_size != 0 {
            return Err(DecodeError::MalformedRecord {
                offset: record_offset,
                reason: format!("region {start:#x}..{end:#x} is not a whole number of pages"),
            });
        }

        let pages = usize::try_from((end - start) / page_size).map_err(|_| {
            DecodeError::MalformedRecord {
                offset: record_offset,
                reason: format!("region {start:#x}..{end:#x} is too large"),
            }
        })?;
        // Both arrays must fit before allocating either.
        let array_bytes = pages.checked_mul(8).unwrap_or(usize::MAX);
        reader.ensure(array_bytes, "per-page arrays")?;

        let use_counts = reader.read_u32_array(pages, "use counts")?;
        let combined_flags = reader.read_u32_array(pages, "combined flags")?;

        regions.push(MappedRegion {
            start,
            end,
            // Names that are not UTF-8 keep their valid parts; invalid
            // sequences become U+FFFD.
            backing_file: String::from_utf8_lossy(name).into_owned(),
            use_counts,
            combined_flags,
        });
    }

    Ok(regions)
}
