//! Stream reassembly: raw TCP chunks in, complete packets out.

use bytes::{Buf, BytesMut};

use crate::error::{BridgeError, Result};
use crate::protocol::packet::{decode_packet, Packet, HEADER_LEN};

/// Default upper bound for a declared frame size.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Per-connection accumulator.
///
/// Partial data (including a size prefix split across reads) is kept until
/// the rest arrives; several frames in one chunk are all yielded, in order.
#[derive(Debug)]
pub struct FrameReassembler {
    buf: BytesMut,
    max_frame_bytes: usize,
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameReassembler {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_frame_bytes,
        }
    }

    /// Bytes waiting for the rest of their frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Append a chunk and cut every complete frame now available.
    ///
    /// An error means the stream is unrecoverable; the caller drops the
    /// connection.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Packet>> {
        self.buf.extend_from_slice(chunk);

        let mut out = Vec::new();
        while let Some(size) = self.peek_size() {
            if size < HEADER_LEN || size > self.max_frame_bytes {
                return Err(BridgeError::InvalidFrameSize(size));
            }
            if self.buf.len() < size {
                break;
            }
            let frame = self.buf.split_to(size);
            out.push(decode_packet(&frame)?);
        }
        Ok(out)
    }

    fn peek_size(&self) -> Option<usize> {
        let mut head = self.buf.get(..4)?;
        Some(head.get_u32_le() as usize)
    }
}
