use serde::Serialize;

/// The one registered appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    /// Bridge-assigned id, echoed back by the device in every header.
    pub id: u32,
    pub serial_number: String,
    pub software_version: String,
}
