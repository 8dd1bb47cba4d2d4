//! Opcode dispatch.
//!
//! Re-exports the dispatcher, the handler trait and the per-packet context.

pub mod dispatcher;

pub use dispatcher::{Dispatcher, OpcodeHandler, PacketCtx};
