//! Top-level facade crate for congabridge.
//!
//! Re-exports the protocol/model core and the gateway so users can depend on a single crate.

pub mod core {
    pub use congabridge_core::*;
}

pub mod gateway {
    pub use congabridge_gateway::*;
}
