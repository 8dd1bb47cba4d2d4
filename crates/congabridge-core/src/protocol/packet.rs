//! Packet framing (24-byte header + payload).
//!
//! Header layout as read from the wire:
//!
//! ```text
//! size:u32 ctype:u8 flow:u8 device_id:u32 user_id:u32 sequence:u64 opcode:u16
//! ```
//!
//! The appliance writes the two id fields in the opposite order from the one it
//! reads them in, so `encode_packet` emits `user_id` before `device_id`. Both
//! orders must stay exactly as they are for the device to accept our frames.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{BridgeError, Result};
use crate::protocol::opcode::Opcode;

/// Header length in bytes.
pub const HEADER_LEN: usize = 24;

/// Connection type stamped on every frame the bridge originates.
pub const DEFAULT_CTYPE: u8 = 2;

/// One protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub ctype: u8,
    /// 0 = request, 1 = reply.
    pub flow: u8,
    pub device_id: u32,
    pub user_id: u32,
    pub sequence: u64,
    pub opcode: u16,
    pub payload: Bytes,
}

impl Packet {
    /// Declared total size (header included).
    pub fn size(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Symbolic opcode, if the code is in the table.
    pub fn op(&self) -> Option<Opcode> {
        Opcode::from_code(self.opcode)
    }

    /// Build a reply to this packet: same addressing and sequence, new opcode
    /// and payload, `flow` bumped by one.
    pub fn reply(&self, op: Opcode, payload: Bytes) -> Packet {
        let mut packet = self.clone();
        packet.opcode = op.code();
        packet.payload = payload;
        packet.flow = packet.flow.wrapping_add(1);
        packet
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[S: {:x}] [F: {}] ", self.sequence, self.flow)?;
        match self.op() {
            Some(op) => write!(f, "[{op}]")?,
            None => write!(f, "[{:x}]", self.opcode)?,
        }
        write!(
            f,
            " [U: {}] [D: {}] ({} bytes)",
            self.user_id,
            self.device_id,
            self.payload.len()
        )
    }
}

/// Decode one packet from the front of `buf`.
///
/// Fails with `TruncatedFrame` when `buf` holds fewer bytes than the header
/// declares. Bytes beyond the declared size are ignored.
pub fn decode_packet(buf: &[u8]) -> Result<Packet> {
    let mut b = buf;
    if b.remaining() < 4 {
        return Err(BridgeError::TruncatedFrame {
            declared: HEADER_LEN,
            available: buf.len(),
        });
    }
    let size = b.get_u32_le() as usize;
    if size < HEADER_LEN {
        return Err(BridgeError::InvalidFrameSize(size));
    }
    if buf.len() < size {
        return Err(BridgeError::TruncatedFrame {
            declared: size,
            available: buf.len(),
        });
    }

    let ctype = b.get_u8();
    let flow = b.get_u8();
    let device_id = b.get_u32_le();
    let user_id = b.get_u32_le();
    let sequence = b.get_u64_le();
    let opcode = b.get_u16_le();
    let payload = b.copy_to_bytes(size - HEADER_LEN);

    Ok(Packet {
        ctype,
        flow,
        device_id,
        user_id,
        sequence,
        opcode,
        payload,
    })
}

/// Encode a packet to wire bytes (`user_id` before `device_id`).
pub fn encode_packet(packet: &Packet) -> Bytes {
    let mut out = BytesMut::with_capacity(packet.size());
    out.put_u32_le(packet.size() as u32);
    out.put_u8(packet.ctype);
    out.put_u8(packet.flow);
    out.put_u32_le(packet.user_id);
    out.put_u32_le(packet.device_id);
    out.put_u64_le(packet.sequence);
    out.put_u16_le(packet.opcode);
    out.put_slice(&packet.payload);
    out.freeze()
}

/// Outbound addressing for one connection.
///
/// Stamps the current user/device ids on every request and hands out
/// monotonically increasing sequence numbers (one per built packet).
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    ctype: u8,
    user_id: u32,
    device_id: u32,
    sequence: u64,
}

impl Default for PacketBuilder {
    fn default() -> Self {
        Self {
            ctype: DEFAULT_CTYPE,
            user_id: 0,
            device_id: 0,
            sequence: 0,
        }
    }
}

impl PacketBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user_id(&mut self, user_id: u32) {
        self.user_id = user_id;
    }

    pub fn set_device_id(&mut self, device_id: u32) {
        self.device_id = device_id;
    }

    pub fn user_id(&self) -> u32 {
        self.user_id
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    /// Sequence number the next built packet will carry.
    pub fn next_sequence(&self) -> u64 {
        self.sequence
    }

    /// Build a request packet and advance the sequence.
    pub fn build(&mut self, op: Opcode, payload: Bytes) -> Packet {
        let sequence = self.sequence;
        self.sequence += 1;
        Packet {
            ctype: self.ctype,
            flow: 0,
            device_id: self.device_id,
            user_id: self.user_id,
            sequence,
            opcode: op.code(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn sample() -> Packet {
        Packet {
            ctype: 2,
            flow: 0,
            device_id: 0xB0B0,
            user_id: 0xA0A0,
            sequence: 0x0102_0304_0506,
            opcode: Opcode::QPing.code(),
            payload: Bytes::from_static(b"\x08\x01"),
        }
    }

    #[test]
    fn encode_then_decode_swaps_ids() {
        let p = sample();
        let wire = encode_packet(&p);
        assert_eq!(wire.len(), HEADER_LEN + 2);

        let back = decode_packet(&wire).unwrap();
        assert_eq!(back.ctype, p.ctype);
        assert_eq!(back.flow, p.flow);
        assert_eq!(back.sequence, p.sequence);
        assert_eq!(back.opcode, p.opcode);
        assert_eq!(back.payload, p.payload);
        // encoded user_id lands where decode reads device_id
        assert_eq!(back.device_id, 0xA0A0);
        assert_eq!(back.user_id, 0xB0B0);
    }

    #[test]
    fn header_layout_is_little_endian() {
        let wire = encode_packet(&sample());
        assert_eq!(&wire[0..4], &26u32.to_le_bytes());
        assert_eq!(wire[4], 2);
        assert_eq!(wire[5], 0);
        assert_eq!(&wire[6..10], &0xA0A0u32.to_le_bytes());
        assert_eq!(&wire[10..14], &0xB0B0u32.to_le_bytes());
        assert_eq!(&wire[22..24], &0x07D5u16.to_le_bytes());
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let wire = encode_packet(&sample());
        let err = decode_packet(&wire[..wire.len() - 1]).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::TruncatedFrame { declared: 26, available: 25 }
        ));
        assert!(decode_packet(&wire[..3]).is_err());
    }

    #[test]
    fn undersized_declaration_is_rejected() {
        let mut wire = encode_packet(&sample()).to_vec();
        wire[0..4].copy_from_slice(&10u32.to_le_bytes());
        assert!(matches!(
            decode_packet(&wire).unwrap_err(),
            BridgeError::InvalidFrameSize(10)
        ));
    }

    #[test]
    fn reply_clones_and_bumps_flow() {
        let req = sample();
        let rep = req.reply(Opcode::RPing, Bytes::new());
        assert_eq!(rep.flow, 1);
        assert_eq!(rep.sequence, req.sequence);
        assert_eq!(rep.device_id, req.device_id);
        assert_eq!(rep.op(), Some(Opcode::RPing));
        assert!(rep.payload.is_empty());
    }

    #[test]
    fn builder_counts_sequence_and_stamps_ids() {
        let mut b = PacketBuilder::new();
        let first = b.build(Opcode::QDeviceCheck, Bytes::new());
        b.set_user_id(7);
        b.set_device_id(9);
        let second = b.build(Opcode::QDeviceTime, Bytes::new());

        assert_eq!(first.sequence, 0);
        assert_eq!((first.user_id, first.device_id), (0, 0));
        assert_eq!(second.sequence, 1);
        assert_eq!((second.user_id, second.device_id), (7, 9));
        assert_eq!(second.ctype, DEFAULT_CTYPE);
        assert_eq!(second.flow, 0);
        assert_eq!(b.next_sequence(), 2);
    }
}
