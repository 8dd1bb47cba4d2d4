//! congabridge core: transport-agnostic protocol primitives, device model and
//! error types.
//!
//! This crate defines the wire-level contracts of the appliance protocol
//! (framing, opcodes, payload schemas, binary map sections) and the pure
//! derivation logic over device telemetry. It carries no runtime or socket
//! dependencies so it can be driven from the gateway, tests and tooling alike.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `BridgeError`/`Result` so malformed traffic
//! from the device never takes the bridge down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;
pub mod protocol;

/// Shared result type.
pub use error::{BridgeError, ErrorClass, Result};
