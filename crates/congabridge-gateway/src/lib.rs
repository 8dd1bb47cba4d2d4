//! congabridge gateway library entry.
//!
//! Wires the device transport, opcode dispatcher and device session into a
//! running bridge, plus the HTTP control surface. Consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod ops;
pub mod router;
pub mod session;
pub mod transport;

pub use bridge::Bridge;
