//! Opcode → payload format registry and the payload codec built on it.
//!
//! An opcode's payload is either a Protocol-Buffers message (`Schema`), a
//! bespoke binary section (`BinaryFormat`), or uninterpreted. The registry is
//! a fixed `match`; nothing is registered at runtime.

use bytes::Bytes;
use prost::Message as _;

use crate::error::{BridgeError, Result};
use crate::protocol::map::{self, AreaListData, ChargerPose, MapData, RobotPose};
use crate::protocol::messages::*;
use crate::protocol::opcode::Opcode;

/// Protocol-Buffers schemas known to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    SignupRequest,
    SignupReply,
    LoginRequest,
    LoginReply,
    BatteryLevel,
    DeviceStatus,
    ResultReply,
    SetFanMode,
    ReturnHome,
    CleanMode,
    SetPosition,
    Unk2,
    MapInfoRequest,
    SetArea,
    CleanArea,
}

/// Bespoke binary payload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryFormat {
    Map,
    AreaList,
    RobotPose,
    ChargerPose,
}

/// How an opcode's payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Schema(Schema),
    Binary(BinaryFormat),
    Opaque,
}

impl PayloadFormat {
    /// Registry lookup.
    pub fn of(op: Opcode) -> Self {
        use Opcode::*;
        match op {
            QDeviceSignup => PayloadFormat::Schema(Schema::SignupRequest),
            RDeviceSignup => PayloadFormat::Schema(Schema::SignupReply),
            QDeviceLogin => PayloadFormat::Schema(Schema::LoginRequest),
            RDeviceLogin => PayloadFormat::Schema(Schema::LoginReply),
            QBatteryLevel => PayloadFormat::Schema(Schema::BatteryLevel),
            QDeviceStatus => PayloadFormat::Schema(Schema::DeviceStatus),
            RBatteryLevel | RDeviceInfo | RDeviceVersion | RDeviceOta | RUnk1 => {
                PayloadFormat::Schema(Schema::ResultReply)
            }
            QSetFanMode => PayloadFormat::Schema(Schema::SetFanMode),
            QReturnHome => PayloadFormat::Schema(Schema::ReturnHome),
            QCleanMode => PayloadFormat::Schema(Schema::CleanMode),
            QSetPosition => PayloadFormat::Schema(Schema::SetPosition),
            QUnk2 => PayloadFormat::Schema(Schema::Unk2),
            QMapInfo => PayloadFormat::Schema(Schema::MapInfoRequest),
            QSetArea => PayloadFormat::Schema(Schema::SetArea),
            QCleanArea => PayloadFormat::Schema(Schema::CleanArea),
            RMapInfo | RMapUpdate => PayloadFormat::Binary(BinaryFormat::Map),
            RAreaListInfo => PayloadFormat::Binary(BinaryFormat::AreaList),
            RUpdateRobotPosition => PayloadFormat::Binary(BinaryFormat::RobotPose),
            RUpdateChargePosition => PayloadFormat::Binary(BinaryFormat::ChargerPose),
            _ => PayloadFormat::Opaque,
        }
    }
}

/// A schema-typed message body.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    SignupRequest(SignupRequest),
    SignupReply(SignupReply),
    LoginRequest(LoginRequest),
    LoginReply(LoginReply),
    BatteryLevel(BatteryLevel),
    DeviceStatus(DeviceStatusReport),
    ResultReply(ResultReply),
    SetFanMode(SetFanMode),
    ReturnHome(ReturnHome),
    CleanMode(CleanMode),
    SetPosition(SetPosition),
    Unk2(Unk2),
    MapInfoRequest(MapInfoRequest),
    SetArea(SetArea),
    CleanArea(CleanArea),
}

impl Message {
    /// Plain `{ result }` acknowledgement.
    pub fn ok() -> Self {
        Message::ResultReply(ResultReply { result: 0 })
    }

    pub fn schema(&self) -> Schema {
        match self {
            Message::SignupRequest(_) => Schema::SignupRequest,
            Message::SignupReply(_) => Schema::SignupReply,
            Message::LoginRequest(_) => Schema::LoginRequest,
            Message::LoginReply(_) => Schema::LoginReply,
            Message::BatteryLevel(_) => Schema::BatteryLevel,
            Message::DeviceStatus(_) => Schema::DeviceStatus,
            Message::ResultReply(_) => Schema::ResultReply,
            Message::SetFanMode(_) => Schema::SetFanMode,
            Message::ReturnHome(_) => Schema::ReturnHome,
            Message::CleanMode(_) => Schema::CleanMode,
            Message::SetPosition(_) => Schema::SetPosition,
            Message::Unk2(_) => Schema::Unk2,
            Message::MapInfoRequest(_) => Schema::MapInfoRequest,
            Message::SetArea(_) => Schema::SetArea,
            Message::CleanArea(_) => Schema::CleanArea,
        }
    }

    fn encode_to_vec(&self) -> Vec<u8> {
        match self {
            Message::SignupRequest(m) => m.encode_to_vec(),
            Message::SignupReply(m) => m.encode_to_vec(),
            Message::LoginRequest(m) => m.encode_to_vec(),
            Message::LoginReply(m) => m.encode_to_vec(),
            Message::BatteryLevel(m) => m.encode_to_vec(),
            Message::DeviceStatus(m) => m.encode_to_vec(),
            Message::ResultReply(m) => m.encode_to_vec(),
            Message::SetFanMode(m) => m.encode_to_vec(),
            Message::ReturnHome(m) => m.encode_to_vec(),
            Message::CleanMode(m) => m.encode_to_vec(),
            Message::SetPosition(m) => m.encode_to_vec(),
            Message::Unk2(m) => m.encode_to_vec(),
            Message::MapInfoRequest(m) => m.encode_to_vec(),
            Message::SetArea(m) => m.encode_to_vec(),
            Message::CleanArea(m) => m.encode_to_vec(),
        }
    }
}

impl Schema {
    fn decode(self, buf: &[u8]) -> std::result::Result<Message, prost::DecodeError> {
        Ok(match self {
            Schema::SignupRequest => Message::SignupRequest(SignupRequest::decode(buf)?),
            Schema::SignupReply => Message::SignupReply(SignupReply::decode(buf)?),
            Schema::LoginRequest => Message::LoginRequest(LoginRequest::decode(buf)?),
            Schema::LoginReply => Message::LoginReply(LoginReply::decode(buf)?),
            Schema::BatteryLevel => Message::BatteryLevel(BatteryLevel::decode(buf)?),
            Schema::DeviceStatus => Message::DeviceStatus(DeviceStatusReport::decode(buf)?),
            Schema::ResultReply => Message::ResultReply(ResultReply::decode(buf)?),
            Schema::SetFanMode => Message::SetFanMode(SetFanMode::decode(buf)?),
            Schema::ReturnHome => Message::ReturnHome(ReturnHome::decode(buf)?),
            Schema::CleanMode => Message::CleanMode(CleanMode::decode(buf)?),
            Schema::SetPosition => Message::SetPosition(SetPosition::decode(buf)?),
            Schema::Unk2 => Message::Unk2(Unk2::decode(buf)?),
            Schema::MapInfoRequest => Message::MapInfoRequest(MapInfoRequest::decode(buf)?),
            Schema::SetArea => Message::SetArea(SetArea::decode(buf)?),
            Schema::CleanArea => Message::CleanArea(CleanArea::decode(buf)?),
        })
    }
}

/// Decoded payload, shaped by the opcode.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    Message(Message),
    Map(Box<MapData>),
    AreaList(Box<AreaListData>),
    RobotPose(RobotPose),
    ChargerPose(ChargerPose),
}

/// Stateless payload codec over the registry.
pub struct PayloadCodec;

impl PayloadCodec {
    /// Decode a payload for `op`.
    ///
    /// Empty payloads and opaque opcodes decode to `None`.
    pub fn decode(op: Opcode, payload: &[u8]) -> Result<Option<DecodedPayload>> {
        if payload.is_empty() {
            return Ok(None);
        }
        let decoded = match PayloadFormat::of(op) {
            PayloadFormat::Schema(schema) => {
                let msg = schema.decode(payload).map_err(|e| BridgeError::SchemaDecode {
                    opname: op.as_str(),
                    reason: e.to_string(),
                })?;
                DecodedPayload::Message(msg)
            }
            PayloadFormat::Binary(BinaryFormat::Map) => {
                DecodedPayload::Map(Box::new(map::decode_map(payload)?))
            }
            PayloadFormat::Binary(BinaryFormat::AreaList) => {
                DecodedPayload::AreaList(Box::new(map::decode_area_list(payload)?))
            }
            PayloadFormat::Binary(BinaryFormat::RobotPose) => {
                DecodedPayload::RobotPose(map::decode_robot_pose(payload)?)
            }
            PayloadFormat::Binary(BinaryFormat::ChargerPose) => {
                DecodedPayload::ChargerPose(map::decode_charger_pose(payload)?)
            }
            PayloadFormat::Opaque => return Ok(None),
        };
        Ok(Some(decoded))
    }

    /// Encode an outbound payload for `op`.
    ///
    /// `None` always encodes to an empty payload. A message must belong to the
    /// schema registered for `op`.
    pub fn encode(op: Opcode, msg: Option<&Message>) -> Result<Bytes> {
        let Some(msg) = msg else {
            return Ok(Bytes::new());
        };
        match PayloadFormat::of(op) {
            PayloadFormat::Schema(schema) if schema == msg.schema() => {
                Ok(Bytes::from(msg.encode_to_vec()))
            }
            PayloadFormat::Schema(schema) => Err(BridgeError::SchemaValidation(format!(
                "{op} expects {schema:?}, got {:?}",
                msg.schema()
            ))),
            _ => Err(BridgeError::SchemaValidation(format!(
                "{op} has no message schema"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn schema_roundtrip_through_codec() {
        let msg = Message::LoginReply(LoginReply {
            result: 12002,
            reason: "Device not registered(devsn: X)".into(),
        });
        let bytes = PayloadCodec::encode(Opcode::RDeviceLogin, Some(&msg)).unwrap();
        let back = PayloadCodec::decode(Opcode::RDeviceLogin, &bytes).unwrap();
        assert_eq!(back, Some(DecodedPayload::Message(msg)));
    }

    #[test]
    fn encode_rejects_foreign_schema() {
        let msg = Message::CleanArea(CleanArea { unk1: 1 });
        let err = PayloadCodec::encode(Opcode::QSetFanMode, Some(&msg)).unwrap_err();
        assert!(matches!(err, BridgeError::SchemaValidation(_)));

        let err = PayloadCodec::encode(Opcode::QPing, Some(&msg)).unwrap_err();
        assert!(matches!(err, BridgeError::SchemaValidation(_)));
    }

    #[test]
    fn no_message_encodes_empty() {
        assert!(PayloadCodec::encode(Opcode::QConnectDevice, None)
            .unwrap()
            .is_empty());
        assert!(PayloadCodec::encode(Opcode::QDeviceCheck, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn opaque_and_empty_payloads_decode_to_none() {
        assert_eq!(PayloadCodec::decode(Opcode::QPing, b"\x01\x02").unwrap(), None);
        assert_eq!(PayloadCodec::decode(Opcode::QDeviceStatus, b"").unwrap(), None);
    }

    #[test]
    fn garbage_protobuf_is_a_decode_error() {
        let err = PayloadCodec::decode(Opcode::QDeviceLogin, &[0x0A, 0x05, b'a']).unwrap_err();
        assert!(matches!(err, BridgeError::SchemaDecode { .. }));
    }

    #[test]
    fn binary_opcodes_route_to_map_decoders() {
        assert_eq!(
            PayloadFormat::of(Opcode::RMapUpdate),
            PayloadFormat::Binary(BinaryFormat::Map)
        );
        assert_eq!(
            PayloadFormat::of(Opcode::RAreaListInfo),
            PayloadFormat::Binary(BinaryFormat::AreaList)
        );
        let err = PayloadCodec::decode(Opcode::RMapInfo, b"\x00\x01").unwrap_err();
        assert!(matches!(err, BridgeError::CorruptMapPayload(_)));
    }
}
