//! Protocol-Buffers message bodies.
//!
//! Field tags follow declaration order of the appliance's message catalogue.

use prost::Message;

/// `QMSG_DEVICE_SIGNUP`
#[derive(Clone, PartialEq, Message)]
pub struct SignupRequest {
    #[prost(string, tag = "1")]
    pub device_serial_number: String,
    #[prost(string, tag = "2")]
    pub software_version: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignupDevice {
    #[prost(uint32, tag = "1")]
    pub id: u32,
}

/// `RMSG_DEVICE_SIGNUP`
#[derive(Clone, PartialEq, Message)]
pub struct SignupReply {
    #[prost(uint32, tag = "1")]
    pub result: u32,
    #[prost(message, optional, tag = "2")]
    pub device: Option<SignupDevice>,
}

/// `QMSG_DEVICE_LOGIN`
#[derive(Clone, PartialEq, Message)]
pub struct LoginRequest {
    #[prost(string, tag = "1")]
    pub device_serial_number: String,
}

/// `RMSG_DEVICE_LOGIN`
#[derive(Clone, PartialEq, Message)]
pub struct LoginReply {
    #[prost(uint32, tag = "1")]
    pub result: u32,
    #[prost(string, tag = "2")]
    pub reason: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct BatteryInfo {
    #[prost(uint32, tag = "1")]
    pub level: u32,
}

/// `QMSG_BATTERY_LEVEL`
#[derive(Clone, PartialEq, Message)]
pub struct BatteryLevel {
    #[prost(message, optional, tag = "1")]
    pub battery: Option<BatteryInfo>,
}

/// `QMSG_DEVICE_STATUS`
#[derive(Clone, PartialEq, Message)]
pub struct DeviceStatusReport {
    #[prost(uint32, tag = "1")]
    pub work_mode: u32,
    #[prost(uint32, tag = "2")]
    pub battery: u32,
    #[prost(bool, tag = "3")]
    pub charge_status: bool,
    #[prost(uint32, tag = "4")]
    pub clean_time: u32,
    #[prost(uint32, tag = "5")]
    pub clean_size: u32,
    #[prost(uint32, tag = "6")]
    pub r#type: u32,
    #[prost(uint32, tag = "7")]
    pub clean_preference: u32,
}

/// Plain acknowledgement (`RMSG_BATTERY_LEVEL`, `RMSG_DEVICE_INFO`, ...).
#[derive(Clone, PartialEq, Message)]
pub struct ResultReply {
    #[prost(uint32, tag = "1")]
    pub result: u32,
}

/// `QMSG_SET_FAN_MODE`
#[derive(Clone, PartialEq, Message)]
pub struct SetFanMode {
    #[prost(uint32, tag = "1")]
    pub mode: u32,
}

/// `QMSG_RETURN_HOME`
#[derive(Clone, PartialEq, Message)]
pub struct ReturnHome {
    #[prost(uint32, tag = "1")]
    pub unk1: u32,
}

/// `QMSG_CLEAN_MODE`
#[derive(Clone, PartialEq, Message)]
pub struct CleanMode {
    #[prost(uint32, tag = "1")]
    pub mode: u32,
    #[prost(uint32, tag = "2")]
    pub unk1: u32,
}

/// `QMSG_SET_POSITION`
#[derive(Clone, PartialEq, Message)]
pub struct SetPosition {
    #[prost(uint32, tag = "1")]
    pub map_head_id: u32,
    #[prost(float, tag = "2")]
    pub pose_x: f32,
    #[prost(float, tag = "3")]
    pub pose_y: f32,
    #[prost(float, tag = "4")]
    pub pose_phi: f32,
    #[prost(uint32, tag = "5")]
    pub update: u32,
}

/// `QMSG_UNK2`, sent once during the handshake.
#[derive(Clone, PartialEq, Message)]
pub struct Unk2 {
    #[prost(uint32, tag = "1")]
    pub unk1: u32,
    #[prost(string, tag = "2")]
    pub unk2: String,
}

/// `QMSG_MAP_INFO`
#[derive(Clone, PartialEq, Message)]
pub struct MapInfoRequest {
    #[prost(uint32, tag = "1")]
    pub mask: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct Coordinate {
    #[prost(float, tag = "1")]
    pub x: f32,
    #[prost(float, tag = "2")]
    pub y: f32,
}

#[derive(Clone, PartialEq, Message)]
pub struct CleanAreaEntry {
    #[prost(uint32, tag = "1")]
    pub clean_area_id: u32,
    #[prost(uint32, tag = "2")]
    pub unk1: u32,
    #[prost(uint32, tag = "3")]
    pub coordinate_length: u32,
    #[prost(message, repeated, tag = "4")]
    pub coordinate_list: Vec<Coordinate>,
}

/// `QMSG_SET_AREA`
#[derive(Clone, PartialEq, Message)]
pub struct SetArea {
    #[prost(uint32, tag = "1")]
    pub map_head_id: u32,
    #[prost(uint32, tag = "2")]
    pub unk1: u32,
    #[prost(uint32, tag = "3")]
    pub clean_area_length: u32,
    #[prost(message, repeated, tag = "4")]
    pub clean_area_list: Vec<CleanAreaEntry>,
}

/// `QMSG_CLEAN_AREA`
#[derive(Clone, PartialEq, Message)]
pub struct CleanArea {
    #[prost(uint32, tag = "1")]
    pub unk1: u32,
}
