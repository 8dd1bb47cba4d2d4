//! Device-side model: registered device identity, raw telemetry with its
//! derived robot state, and the current map snapshot.

pub mod device;
pub mod map;
pub mod status;

pub use device::Device;
pub use map::{MapModel, PixelPoint, WorldPoint, MARKER_SCALE};
pub use status::{
    BatteryFlag, BatteryState, CleanupStats, DeviceStatus, FanSpeed, RobotState, StatusFlag,
    StatusValue,
};
