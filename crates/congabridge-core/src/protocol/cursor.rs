//! Sequential, bounds-checked reader over an in-memory buffer.
//!
//! Parsing rules:
//! - Never index (`buf[0]`); always check `remaining()` before a `Buf` read.
//! - Never return partial or zero-filled data: a short read is an error.

use bytes::Buf;

use crate::error::{BridgeError, Result};

/// Forward-only cursor. Position only ever increases.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, wanted: usize) -> Result<()> {
        if self.buf.remaining() < wanted {
            return Err(BridgeError::UnexpectedEof {
                wanted,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.buf.get_u64_le())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.buf.get_f32_le())
    }

    /// Read exactly `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    /// One length byte followed by that many UTF-8 bytes.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u8()? as usize;
        if len == 0 {
            return Ok(String::new());
        }
        let raw = self.read_bytes(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|e| BridgeError::InvalidString(e.to_string()))
    }

    /// Read `count` consecutive f32 values.
    pub fn read_f32_vec(&mut self, count: usize) -> Result<Vec<f32>> {
        self.ensure(count.saturating_mul(4))?;
        (0..count).map(|_| self.read_f32()).collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn reads_fixed_width_little_endian() {
        let mut raw = vec![0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        raw.extend_from_slice(&9u64.to_le_bytes());
        raw.extend_from_slice(&1.5f32.to_le_bytes());

        let mut c = ByteCursor::new(&raw);
        assert_eq!(c.read_u8().unwrap(), 1);
        assert_eq!(c.read_u16().unwrap(), 0x1234);
        assert_eq!(c.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(c.read_u64().unwrap(), 9);
        assert_eq!(c.read_f32().unwrap(), 1.5);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn short_read_fails_without_consuming() {
        let raw = [0xAA, 0xBB];
        let mut c = ByteCursor::new(&raw);
        let err = c.read_u32().unwrap_err();
        assert!(matches!(
            err,
            BridgeError::UnexpectedEof { wanted: 4, remaining: 2 }
        ));
        assert_eq!(c.remaining(), 2);
    }

    #[test]
    fn strings_are_length_prefixed() {
        let raw = [3, b'a', b'b', b'c', 0, 7];
        let mut c = ByteCursor::new(&raw);
        assert_eq!(c.read_string().unwrap(), "abc");
        // zero length consumes only the length byte
        assert_eq!(c.read_string().unwrap(), "");
        assert_eq!(c.read_u8().unwrap(), 7);
    }

    #[test]
    fn truncated_string_is_an_error() {
        let raw = [5, b'a', b'b'];
        let mut c = ByteCursor::new(&raw);
        assert!(c.read_string().is_err());
    }
}
