//! Opcode and command tables.
//!
//! Both tables are fixed by the appliance firmware and must match it verbatim.
//! `Q` opcodes are requests, `R` opcodes are replies.

macro_rules! opcodes {
    ($($variant:ident = $code:literal => $name:literal,)+) => {
        /// Symbolic opcode.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $($variant,)+
        }

        impl Opcode {
            /// Every known opcode, in table order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)+];

            /// Wire code.
            pub fn code(self) -> u16 {
                match self {
                    $(Opcode::$variant => $code,)+
                }
            }

            /// Opname as used by the firmware (e.g. `QMSG_DEVICE_LOGIN`).
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $name,)+
                }
            }

            /// Reverse lookup. Unknown codes return `None`.
            pub fn from_code(code: u16) -> Option<Self> {
                match code {
                    $($code => Some(Opcode::$variant),)+
                    _ => None,
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Opcode::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    QDeviceLogin = 0x07D1 => "QMSG_DEVICE_LOGIN",
    RDeviceLogin = 0x07D2 => "RMSG_DEVICE_LOGIN",
    QPing = 0x07D5 => "QMSG_PING",
    RPing = 0x07D6 => "RMSG_PING",
    QDeviceSignup = 0x0FA1 => "QMSG_DEVICE_SIGNUP",
    RDeviceSignup = 0x0FA2 => "RMSG_DEVICE_SIGNUP",
    QDeviceTime = 0x1011 => "QMSG_DEVICE_TIME",
    RDeviceTime = 0x1012 => "RMSG_DEVICE_TIME",
    QReturnHome = 0x1069 => "QMSG_RETURN_HOME",
    RReturnHome = 0x106A => "RMSG_RETURN_HOME",
    QCleanArea = 0x106B => "QMSG_CLEAN_AREA",
    RCleanArea = 0x106C => "RMSG_CLEAN_AREA",
    QCleanMode = 0x106D => "QMSG_CLEAN_MODE",
    RCleanMode = 0x106E => "RMSG_CLEAN_MODE",
    QDeviceCheck = 0x1079 => "QMSG_DEVICE_CHECK",
    RDeviceCheck = 0x107A => "RMSG_DEVICE_CHECK",
    QSetFanMode = 0x10D9 => "QMSG_SET_FAN_MODE",
    RSetFanMode = 0x10DA => "RMSG_SET_FAN_MODE",
    QConnectDevice = 0x1009 => "QMSG_CONNECT_DEVICE",
    QDeviceStatus = 0x10FE => "QMSG_DEVICE_STATUS",
    QLocateDevice = 0x10EB => "QMSG_LOCATE_DEVICE",
    RLocateDevice = 0x10EC => "RMSG_LOCATE_DEVICE",
    QSetArea = 0x1101 => "QMSG_SET_AREA",
    RSetArea = 0x1102 => "RMSG_SET_AREA",
    QSetPosition = 0x1103 => "QMSG_SET_POSITION",
    RSetPosition = 0x1104 => "RMSG_SET_POSITION",
    QUnk2 = 0x111F => "QMSG_UNK2",
    RUnk2 = 0x1120 => "RMSG_UNK2",
    QMapInfo = 0x1162 => "QMSG_MAP_INFO",
    RMapInfo = 0x1163 => "RMSG_MAP_INFO",
    RMapUpdate = 0x1164 => "RMSG_MAP_UPDATE",
    RUpdateRobotPosition = 0x1166 => "RMSG_UPDATE_ROBOT_POSITION",
    RUpdateChargePosition = 0x1168 => "RMSG_UPDATE_CHARGE_POSITION",
    RAreaListInfo = 0x116A => "RMSG_AREA_LIST_INFO",
    QUnk1 = 0x119A => "QMSG_UNK1",
    RUnk1 = 0x119B => "RMSG_UNK1",
    QDeviceVersion = 0x119C => "QMSG_DEVICE_VERSION",
    RDeviceVersion = 0x119D => "RMSG_DEVICE_VERSION",
    QDeviceOta = 0x1461 => "QMSG_DEVICE_OTA",
    RDeviceOta = 0x1462 => "RMSG_DEVICE_OTA",
    QDeviceInfo = 0x1465 => "QMSG_DEVICE_INFO",
    RDeviceInfo = 0x1466 => "RMSG_DEVICE_INFO",
    QBatteryLevel = 0x146F => "QMSG_BATTERY_LEVEL",
    RBatteryLevel = 0x1470 => "RMSG_BATTERY_LEVEL",
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synchronous command: a request opcode paired with the reply it waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    LocateDevice,
    ReturnHome,
    CleanMode,
    SetFanMode,
    MapInfo,
    SetPosition,
    Unk2,
    DeviceTime,
    DeviceCheck,
    SetArea,
    CleanArea,
}

impl Command {
    /// `(request, reply)` pair.
    pub fn pair(self) -> (Opcode, Opcode) {
        match self {
            Command::LocateDevice => (Opcode::QLocateDevice, Opcode::RLocateDevice),
            Command::ReturnHome => (Opcode::QReturnHome, Opcode::RReturnHome),
            Command::CleanMode => (Opcode::QCleanMode, Opcode::RCleanMode),
            Command::SetFanMode => (Opcode::QSetFanMode, Opcode::RSetFanMode),
            Command::MapInfo => (Opcode::QMapInfo, Opcode::RMapInfo),
            Command::SetPosition => (Opcode::QSetPosition, Opcode::RSetPosition),
            Command::Unk2 => (Opcode::QUnk2, Opcode::RUnk2),
            Command::DeviceTime => (Opcode::QDeviceTime, Opcode::RDeviceTime),
            Command::DeviceCheck => (Opcode::QDeviceCheck, Opcode::RDeviceCheck),
            Command::SetArea => (Opcode::QSetArea, Opcode::RSetArea),
            Command::CleanArea => (Opcode::QCleanArea, Opcode::RCleanArea),
        }
    }

    pub fn request(self) -> Opcode {
        self.pair().0
    }

    pub fn reply(self) -> Opcode {
        self.pair().1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Command::LocateDevice => "LOCATE_DEVICE",
            Command::ReturnHome => "RETURN_HOME",
            Command::CleanMode => "CLEAN_MODE",
            Command::SetFanMode => "SET_FAN_MODE",
            Command::MapInfo => "MAP_INFO",
            Command::SetPosition => "SET_POSITION",
            Command::Unk2 => "UNK2",
            Command::DeviceTime => "DEVICE_TIME",
            Command::DeviceCheck => "DEVICE_CHECK",
            Command::SetArea => "SET_AREA",
            Command::CleanArea => "CLEAN_AREA",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_bijective() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_code(op.code()), Some(*op), "{op}");
            assert_eq!(Opcode::from_name(op.as_str()), Some(*op), "{op}");
        }
        assert_eq!(Opcode::ALL.len(), 44);
    }

    #[test]
    fn known_codes() {
        assert_eq!(Opcode::QDeviceLogin.code(), 0x07D1);
        assert_eq!(Opcode::from_code(0x10EB), Some(Opcode::QLocateDevice));
        assert_eq!(Opcode::from_code(0x146F), Some(Opcode::QBatteryLevel));
        assert_eq!(Opcode::from_code(0xBEEF), None);
    }

    #[test]
    fn commands_pair_query_with_reply() {
        let all = [
            Command::LocateDevice,
            Command::ReturnHome,
            Command::CleanMode,
            Command::SetFanMode,
            Command::MapInfo,
            Command::SetPosition,
            Command::Unk2,
            Command::DeviceTime,
            Command::DeviceCheck,
            Command::SetArea,
            Command::CleanArea,
        ];
        for cmd in all {
            let (q, r) = cmd.pair();
            assert!(q.as_str().starts_with("QMSG_"), "{}", cmd.as_str());
            assert_eq!(r.as_str(), q.as_str().replacen("QMSG_", "RMSG_", 1));
            assert_eq!(q.code() + 1, r.code());
        }
    }
}
