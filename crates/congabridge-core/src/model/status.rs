//! Raw device telemetry and its classification into robot state attributes.

use serde::{Deserialize, Serialize};

use crate::protocol::messages::DeviceStatusReport;

/// Battery level reported by the device at full charge.
pub const BATTERY_MAX: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatteryFlag {
    Charging,
    Discharging,
    Charged,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryState {
    /// Percent, 0..=100.
    pub level: f32,
    pub flag: BatteryFlag,
}

/// Operational status. `Unknown` is a valid value, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusValue {
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "DOCKED")]
    Docked,
    #[serde(rename = "RETURNING")]
    Returning,
    #[serde(rename = "CLEANING")]
    Cleaning,
    #[serde(rename = "IDLE")]
    Idle,
    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusFlag {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "SPOT")]
    Spot,
    #[serde(rename = "unknown")]
    Unknown,
}

/// Suction level, as exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanSpeed {
    Off,
    Low,
    Medium,
    High,
}

impl FanSpeed {
    pub const ALL: [FanSpeed; 4] = [FanSpeed::Off, FanSpeed::Low, FanSpeed::Medium, FanSpeed::High];

    /// Device clean-preference code.
    pub fn mode(self) -> u32 {
        match self {
            FanSpeed::Off => 0,
            FanSpeed::Low => 1,
            FanSpeed::Medium => 2,
            FanSpeed::High => 3,
        }
    }

    /// Reverse lookup; codes outside the table have no fan speed.
    pub fn from_mode(mode: u32) -> Option<Self> {
        FanSpeed::ALL.into_iter().find(|f| f.mode() == mode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanupStats {
    /// Cleaned area (cm²).
    pub area: u32,
    /// Cleaning duration (seconds).
    pub duration: u32,
}

/// Derived robot state handed to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotState {
    pub battery: BatteryState,
    pub status: StatusValue,
    pub status_flag: StatusFlag,
    pub fan_speed: Option<FanSpeed>,
    pub cleanup: CleanupStats,
}

/// Latest raw telemetry snapshot. Mutated in place, never reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    /// `None` until the first full status report.
    pub work_mode: Option<u32>,
    /// 0..=`BATTERY_MAX`.
    pub battery: u32,
    pub charging: bool,
    /// Minutes.
    pub clean_time: u32,
    /// Square metres / 100.
    pub clean_size: u32,
    pub r#type: u32,
    pub clean_preference: u32,
}

impl DeviceStatus {
    /// Apply a full `QMSG_DEVICE_STATUS` report.
    pub fn apply_report(&mut self, report: &DeviceStatusReport) {
        self.work_mode = Some(report.work_mode);
        self.battery = report.battery;
        self.charging = report.charge_status;
        self.clean_time = report.clean_time;
        self.clean_size = report.clean_size;
        self.r#type = report.r#type;
        self.clean_preference = report.clean_preference;
    }

    /// Apply a `QMSG_BATTERY_LEVEL` report; other fields are untouched.
    pub fn apply_battery(&mut self, level: u32) {
        self.battery = level;
    }

    pub fn battery_state(&self) -> BatteryState {
        let flag = match (self.charging, self.battery == BATTERY_MAX) {
            (false, _) => BatteryFlag::Discharging,
            (true, true) => BatteryFlag::Charged,
            (true, false) => BatteryFlag::Charging,
        };
        BatteryState {
            level: self.battery as f32 * 100.0 / BATTERY_MAX as f32,
            flag,
        }
    }

    pub fn status_value(&self) -> StatusValue {
        if !matches!(self.r#type, 0 | 3) {
            return StatusValue::Error;
        }
        if self.charging {
            return StatusValue::Docked;
        }
        match self.work_mode {
            Some(5 | 10) => StatusValue::Returning,
            Some(1 | 7 | 25 | 20 | 30) => StatusValue::Cleaning,
            Some(0 | 4 | 23 | 29) => StatusValue::Idle,
            _ => StatusValue::Unknown,
        }
    }

    pub fn status_flag(&self) -> StatusFlag {
        match self.work_mode {
            Some(0 | 1 | 4 | 5 | 10 | 11) => StatusFlag::None,
            Some(7 | 9 | 14 | 22 | 36 | 37 | 38 | 39 | 40) => StatusFlag::Spot,
            _ => StatusFlag::Unknown,
        }
    }

    pub fn fan_speed(&self) -> Option<FanSpeed> {
        FanSpeed::from_mode(self.clean_preference)
    }

    pub fn cleanup(&self) -> CleanupStats {
        CleanupStats {
            area: self.clean_size.saturating_mul(100),
            duration: self.clean_time.saturating_mul(60),
        }
    }

    pub fn robot_state(&self) -> RobotState {
        RobotState {
            battery: self.battery_state(),
            status: self.status_value(),
            status_flag: self.status_flag(),
            fan_speed: self.fan_speed(),
            cleanup: self.cleanup(),
        }
    }
}
