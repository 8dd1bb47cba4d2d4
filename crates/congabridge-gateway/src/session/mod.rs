//! Device session: registration, handshake, telemetry and commands.
//!
//! `DeviceSession` owns the single appliance's state. The handlers in
//! `handlers` mutate it from inbound packets; the command methods drive the
//! appliance through the command channel.

pub mod device_session;
pub mod handlers;
pub mod observer;

pub use device_session::{DeviceSession, SessionPhase, SessionSnapshot};
pub use handlers::build_dispatcher;
pub use observer::{StateObserver, TracingObserver};
