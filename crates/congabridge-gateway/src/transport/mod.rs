//! Transport layer (device TCP).
//!
//! Each listener owns a `CommandChannel` holding at most one live device
//! connection. The reader loop reassembles frames and hands every packet to
//! the dispatcher exactly once.

pub mod channel;
pub mod listener;

pub use channel::{BoxWriter, CommandChannel, Connection};
pub use listener::serve;
