//! Bounds-checked little-endian field reader over a payload slice.

use crate::error::DecodeError;

/// Sequential reader. Every read either yields the full field or fails
/// with [`DecodeError::MalformedRecord`] without advancing.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Offset of the next unread byte.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fail unless at least `n` more bytes are available.
    pub fn ensure(&self, n: usize, what: &str) -> Result<(), DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::MalformedRecord {
                offset: self.pos,
                reason: format!("{what} needs {n} bytes, {} left in payload", self.remaining()),
            });
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize, what: &str) -> Result<&'a [u8], DecodeError> {
        self.ensure(n, what)?;
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize, what: &str) -> Result<(), DecodeError> {
        self.read_bytes(n, what).map(|_| ())
    }

    pub fn read_u32_le(&mut self, what: &str) -> Result<u32, DecodeError> {
        let bytes = self.read_bytes(4, what)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(raw))
    }

    pub fn read_u64_le(&mut self, what: &str) -> Result<u64, DecodeError> {
        let bytes = self.read_bytes(8, what)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    /// Read `count` consecutive `u32` values.
    pub fn read_u32_array(&mut self, count: usize, what: &str) -> Result<Vec<u32>, DecodeError> {
        let len = count.checked_mul(4).ok_or_else(|| DecodeError::MalformedRecord {
            offset: self.pos,
            reason: format!("{what} element count {count} overflows"),
        })?;
        let bytes = self.read_bytes(len, what)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}

/// Zero bytes needed after a `len`-byte field to reach a 4-byte boundary.
#[inline]
pub const fn padding_for(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fields() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x1122_3344_5566_7788u64.to_le_bytes());
        data.extend_from_slice(&7u32.to_le_bytes());
        data.extend_from_slice(b"abc");

        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u64_le("a").unwrap(), 0x1122_3344_5566_7788);
        assert_eq!(reader.read_u32_le("b").unwrap(), 7);
        assert_eq!(reader.read_bytes(3, "c").unwrap(), b"abc");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_short_read_does_not_advance() {
        let data = [1u8, 2, 3];
        let mut reader = ByteReader::new(&data);
        let err = reader.read_u32_le("count").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedRecord { offset: 0, .. }));
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.remaining(), 3);
    }

    #[test]
    fn test_read_u32_array() {
        let data: Vec<u8> = [1u32, 2, 0xffff_ffff]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u32_array(3, "x").unwrap(), vec![1, 2, 0xffff_ffff]);
        assert!(reader.read_u32_array(1, "x").is_err());
    }

    #[test]
    fn test_padding_for() {
        assert_eq!(padding_for(0), 0);
        assert_eq!(padding_for(1), 3);
        assert_eq!(padding_for(3), 1);
        assert_eq!(padding_for(4), 0);
        assert_eq!(padding_for(13), 3);
    }
}
