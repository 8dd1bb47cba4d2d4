//! Protocol modules.
//!
//! The appliance speaks one framing format on both ports:
//! - a fixed 24-byte little-endian header followed by an opcode-specific
//!   payload (`packet`, `frame`),
//! - payloads that are Protocol-Buffers messages (`messages`, `schema`) or
//!   bespoke zlib-compressed binary sections (`map`).
//!
//! All parsers are panic-free: malformed input is reported as `BridgeError`
//! instead of panicking or indexing raw buffers.

pub mod cursor;
pub mod frame;
pub mod map;
pub mod messages;
pub mod opcode;
pub mod packet;
pub mod schema;

pub use cursor::ByteCursor;
pub use frame::FrameReassembler;
pub use opcode::{Command, Opcode};
pub use packet::{decode_packet, encode_packet, Packet, PacketBuilder, HEADER_LEN};
pub use schema::{DecodedPayload, Message, PayloadCodec, Schema};
