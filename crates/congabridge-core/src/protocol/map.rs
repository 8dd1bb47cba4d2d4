//! Binary map sections carried by the map, area-list and pose opcodes.
//!
//! Map payloads are zlib streams. Once inflated, `RMSG_MAP_INFO` /
//! `RMSG_MAP_UPDATE` open with a u32 section mask and carry one block per set
//! bit, in ascending bit order. `RMSG_AREA_LIST_INFO` reuses most of the
//! grammar without a mask. Pose updates are sent uncompressed.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{BridgeError, Result};
use crate::protocol::cursor::ByteCursor;

/// Upper bound on an inflated map or area-list body.
pub const MAX_INFLATED_MAP_BYTES: usize = 32 * 1024 * 1024;

pub const SECTION_STATUS: u32 = 1 << 0;
pub const SECTION_MAP_HEAD: u32 = 1 << 1;
pub const SECTION_HISTORY: u32 = 1 << 2;
pub const SECTION_CHARGER: u32 = 1 << 3;
pub const SECTION_WALL_LIST: u32 = 1 << 4;
pub const SECTION_AREA_LIST: u32 = 1 << 5;
pub const SECTION_SPOT: u32 = 1 << 6;
pub const SECTION_ROBOT_POSE: u32 = 1 << 7;
/// Sections whose layout is unknown; seeing one aborts the decode.
pub const SECTIONS_UNHANDLED: [u32; 3] = [1 << 8, 1 << 9, 1 << 10];
pub const SECTION_CLEAN_PLAN: u32 = 1 << 11;
pub const SECTION_MAP_INFO_LIST: u32 = 1 << 12;
pub const SECTION_ROOMS: u32 = 1 << 13;

/// Bytes per history point (opaque).
const HISTORY_POINT_LEN: usize = 9;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusInfo {
    pub map_head_id: u32,
    pub has_history_map: u32,
    pub working_mode: u32,
    pub battery_percent: u32,
    pub charge_state: u32,
    pub fault_type: u32,
    pub fault_code: u32,
    pub clean_preference: u32,
    pub repeat_clean: u32,
    pub clean_time: u32,
    pub clean_size: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapHeadInfo {
    pub map_head_id: u32,
    pub map_valid: u32,
    pub map_type: u32,
    pub size_x: u32,
    pub size_y: u32,
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub resolution: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryHeadInfo {
    pub map_head_id: u32,
    pub point_number: u32,
    pub pose_id: u32,
}

/// Charger pose: map section (bit 3) and `RMSG_UPDATE_CHARGE_POSITION`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChargerPose {
    pub id: u32,
    pub pose_x: f32,
    pub pose_y: f32,
    pub pose_phi: f32,
}

/// Wall list / area list header (count only).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListHeader {
    pub map_head_id: u32,
    pub clean_plan_id: u32,
    pub area_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpotInfo {
    pub map_head_id: u32,
    pub ctrl_value: u32,
    pub pose_x: f32,
    pub pose_y: f32,
    pub pose_phi: f32,
}

/// Robot pose: map section (bit 7) and `RMSG_UPDATE_ROBOT_POSITION`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotPose {
    pub map_head_id: u32,
    pub pose_id: u32,
    pub update: u8,
    pub pose_x: f32,
    pub pose_y: f32,
    pub pose_phi: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanPlanInfo {
    pub map_head_id: u32,
    pub mask: u16,
    pub first_clean_flag: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapInfo {
    pub map_head_id: u32,
    pub map_name: String,
    pub current_plan_id: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanRoom {
    pub room_id: u8,
    pub room_name: String,
    pub room_state: u8,
    pub room_x: f32,
    pub room_y: f32,
}

/// Polygon of a clean plan; coordinate arrays all have `points` entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaInfo {
    pub area_id: u32,
    pub area_type: u32,
    pub points: u32,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub unk1: Vec<f32>,
    pub unk2: Vec<f32>,
    pub unk3: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanRoomInfo {
    pub info_id: u8,
    pub info_type: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanPlan {
    pub plan_id: u32,
    pub plan_name: String,
    pub map_head_id: u32,
    pub unk1: u32,
    pub area_info_list: Vec<AreaInfo>,
    pub clean_room_info_list: Vec<CleanRoomInfo>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomEnableInfo {
    pub map_head_id: u32,
    pub size: u8,
}

/// Room layout section (bit 13).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomSection {
    pub clean_room_list: Vec<CleanRoom>,
    pub clean_plan_list: Vec<CleanPlan>,
    /// `rooms * rooms` opaque bytes.
    pub room_matrix: Vec<u8>,
    pub room_enable_info: RoomEnableInfo,
}

/// Decoded `RMSG_MAP_INFO` / `RMSG_MAP_UPDATE`. Absent sections are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapData {
    pub mask: u32,
    pub status_info: Option<StatusInfo>,
    pub map_head_info: Option<MapHeadInfo>,
    pub map_grid: Option<Vec<u8>>,
    pub history_head_info: Option<HistoryHeadInfo>,
    pub history_points: Option<Vec<u8>>,
    pub charger_pose: Option<ChargerPose>,
    pub wall_list_info: Option<ListHeader>,
    pub area_list_info: Option<ListHeader>,
    pub spot_info: Option<SpotInfo>,
    pub robot_pose: Option<RobotPose>,
    pub clean_plan_info: Option<CleanPlanInfo>,
    pub map_info_list: Option<Vec<MapInfo>>,
    pub rooms: Option<RoomSection>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaListHeader {
    pub unk1: u32,
    pub map_head_id: u32,
    pub unk2: u32,
    pub unk3: u32,
}

/// Decoded `RMSG_AREA_LIST_INFO`. Every block is always present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaListData {
    pub header: AreaListHeader,
    pub map_head_info: MapHeadInfo,
    pub map_grid: Vec<u8>,
    pub clean_plan_info: CleanPlanInfo,
    pub map_info_list: Vec<MapInfo>,
    pub clean_room_list: Vec<CleanRoom>,
    pub clean_plan_list: Vec<CleanPlan>,
}

fn inflate(payload: &[u8]) -> Result<Vec<u8>> {
    inflate_limited(payload, MAX_INFLATED_MAP_BYTES)
}

fn inflate_limited(payload: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(payload).take(limit as u64 + 1);
    let mut out = Vec::with_capacity(payload.len().saturating_mul(4).min(limit));
    decoder
        .read_to_end(&mut out)
        .map_err(|e| BridgeError::CorruptMapPayload(e.to_string()))?;
    if out.len() > limit {
        return Err(BridgeError::CorruptMapPayload(format!(
            "inflated size exceeds {limit} bytes"
        )));
    }
    Ok(out)
}

fn read_status_info(c: &mut ByteCursor<'_>) -> Result<StatusInfo> {
    Ok(StatusInfo {
        map_head_id: c.read_u32()?,
        has_history_map: c.read_u32()?,
        working_mode: c.read_u32()?,
        battery_percent: c.read_u32()?,
        charge_state: c.read_u32()?,
        fault_type: c.read_u32()?,
        fault_code: c.read_u32()?,
        clean_preference: c.read_u32()?,
        repeat_clean: c.read_u32()?,
        clean_time: c.read_u32()?,
        clean_size: c.read_u32()?,
    })
}

fn read_map_head_info(c: &mut ByteCursor<'_>) -> Result<MapHeadInfo> {
    Ok(MapHeadInfo {
        map_head_id: c.read_u32()?,
        map_valid: c.read_u32()?,
        map_type: c.read_u32()?,
        size_x: c.read_u32()?,
        size_y: c.read_u32()?,
        min_x: c.read_f32()?,
        min_y: c.read_f32()?,
        max_x: c.read_f32()?,
        max_y: c.read_f32()?,
        resolution: c.read_f32()?,
    })
}

fn read_grid(c: &mut ByteCursor<'_>, head: &MapHeadInfo) -> Result<Vec<u8>> {
    let cells = (head.size_x as usize).saturating_mul(head.size_y as usize);
    Ok(c.read_bytes(cells)?.to_vec())
}

fn read_list_header(c: &mut ByteCursor<'_>) -> Result<ListHeader> {
    Ok(ListHeader {
        map_head_id: c.read_u32()?,
        clean_plan_id: c.read_u32()?,
        area_count: c.read_u32()?,
    })
}

fn read_robot_pose(c: &mut ByteCursor<'_>) -> Result<RobotPose> {
    Ok(RobotPose {
        map_head_id: c.read_u32()?,
        pose_id: c.read_u32()?,
        update: c.read_u8()?,
        pose_x: c.read_f32()?,
        pose_y: c.read_f32()?,
        pose_phi: c.read_f32()?,
    })
}

fn read_charger_pose(c: &mut ByteCursor<'_>) -> Result<ChargerPose> {
    Ok(ChargerPose {
        id: c.read_u32()?,
        pose_x: c.read_f32()?,
        pose_y: c.read_f32()?,
        pose_phi: c.read_f32()?,
    })
}

fn read_clean_plan_info(c: &mut ByteCursor<'_>) -> Result<CleanPlanInfo> {
    Ok(CleanPlanInfo {
        map_head_id: c.read_u32()?,
        mask: c.read_u16()?,
        first_clean_flag: c.read_u8()?,
    })
}

fn read_map_info_list(c: &mut ByteCursor<'_>) -> Result<Vec<MapInfo>> {
    let count = c.read_u8()?;
    let mut list = Vec::with_capacity(count as usize);
    for _ in 0..count {
        list.push(MapInfo {
            map_head_id: c.read_u32()?,
            map_name: c.read_string()?,
            current_plan_id: c.read_u32()?,
        });
    }
    Ok(list)
}

// Counts come off the wire; cap preallocation by what the buffer could hold.
fn capacity(count: u32, remaining: usize, min_item_len: usize) -> usize {
    (count as usize).min(remaining / min_item_len)
}

fn read_clean_room_list(c: &mut ByteCursor<'_>) -> Result<Vec<CleanRoom>> {
    let count = c.read_u32()?;
    let mut list = Vec::with_capacity(capacity(count, c.remaining(), 11));
    for _ in 0..count {
        list.push(CleanRoom {
            room_id: c.read_u8()?,
            room_name: c.read_string()?,
            room_state: c.read_u8()?,
            room_x: c.read_f32()?,
            room_y: c.read_f32()?,
        });
    }
    Ok(list)
}

fn read_area_info_list(c: &mut ByteCursor<'_>) -> Result<Vec<AreaInfo>> {
    let count = c.read_u32()?;
    let mut list = Vec::with_capacity(capacity(count, c.remaining(), 12));
    for _ in 0..count {
        let mut area = AreaInfo {
            area_id: c.read_u32()?,
            area_type: c.read_u32()?,
            points: c.read_u32()?,
            ..AreaInfo::default()
        };
        if area.points > 0 {
            let n = area.points as usize;
            area.x = c.read_f32_vec(n)?;
            area.y = c.read_f32_vec(n)?;
            area.unk1 = c.read_f32_vec(n)?;
            area.unk2 = c.read_f32_vec(n)?;
            area.unk3 = c.read_f32_vec(n)?;
        }
        list.push(area);
    }
    Ok(list)
}

fn read_clean_room_info_list(c: &mut ByteCursor<'_>) -> Result<Vec<CleanRoomInfo>> {
    let count = c.read_u32()?;
    let mut list = Vec::with_capacity(capacity(count, c.remaining(), 2));
    for _ in 0..count {
        list.push(CleanRoomInfo {
            info_id: c.read_u8()?,
            info_type: c.read_u8()?,
        });
    }
    Ok(list)
}

fn read_clean_plan_list(c: &mut ByteCursor<'_>) -> Result<Vec<CleanPlan>> {
    let count = c.read_u8()?;
    let mut list = Vec::with_capacity(count as usize);
    for _ in 0..count {
        list.push(CleanPlan {
            plan_id: c.read_u32()?,
            plan_name: c.read_string()?,
            map_head_id: c.read_u32()?,
            unk1: c.read_u32()?,
            area_info_list: read_area_info_list(c)?,
            clean_room_info_list: read_clean_room_info_list(c)?,
        });
    }
    Ok(list)
}

fn read_room_section(c: &mut ByteCursor<'_>) -> Result<RoomSection> {
    let clean_room_list = read_clean_room_list(c)?;
    let clean_plan_list = read_clean_plan_list(c)?;
    let rooms = clean_room_list.len();
    let room_matrix = c.read_bytes(rooms.saturating_mul(rooms))?.to_vec();
    let room_enable_info = RoomEnableInfo {
        map_head_id: c.read_u32()?,
        size: c.read_u8()?,
    };
    if room_enable_info.size != 0 {
        return Err(BridgeError::UnsupportedRoomEnableInfo(room_enable_info.size));
    }
    Ok(RoomSection {
        clean_room_list,
        clean_plan_list,
        room_matrix,
        room_enable_info,
    })
}

/// Decode a mask-driven map payload (`RMSG_MAP_INFO`, `RMSG_MAP_UPDATE`).
pub fn decode_map(payload: &[u8]) -> Result<MapData> {
    let raw = inflate(payload)?;
    let mut c = ByteCursor::new(&raw);
    let mask = c.read_u32()?;
    let has = |bit: u32| mask & bit != 0;

    let mut data = MapData {
        mask,
        ..MapData::default()
    };

    if has(SECTION_STATUS) {
        data.status_info = Some(read_status_info(&mut c)?);
    }
    if has(SECTION_MAP_HEAD) {
        let head = read_map_head_info(&mut c)?;
        data.map_grid = Some(read_grid(&mut c, &head)?);
        data.map_head_info = Some(head);
    }
    if has(SECTION_HISTORY) {
        let head = HistoryHeadInfo {
            map_head_id: c.read_u32()?,
            point_number: c.read_u32()?,
            pose_id: c.read_u32()?,
        };
        let len = (head.point_number as usize).saturating_mul(HISTORY_POINT_LEN);
        data.history_points = Some(c.read_bytes(len)?.to_vec());
        data.history_head_info = Some(head);
    }
    if has(SECTION_CHARGER) {
        data.charger_pose = Some(read_charger_pose(&mut c)?);
    }
    if has(SECTION_WALL_LIST) {
        data.wall_list_info = Some(read_list_header(&mut c)?);
    }
    if has(SECTION_AREA_LIST) {
        data.area_list_info = Some(read_list_header(&mut c)?);
    }
    if has(SECTION_SPOT) {
        data.spot_info = Some(SpotInfo {
            map_head_id: c.read_u32()?,
            ctrl_value: c.read_u32()?,
            pose_x: c.read_f32()?,
            pose_y: c.read_f32()?,
            pose_phi: c.read_f32()?,
        });
    }
    if has(SECTION_ROBOT_POSE) {
        data.robot_pose = Some(read_robot_pose(&mut c)?);
    }
    if let Some(bit) = SECTIONS_UNHANDLED.iter().copied().find(|b| has(*b)) {
        return Err(BridgeError::UnhandledMapSection(bit));
    }
    if has(SECTION_CLEAN_PLAN) {
        data.clean_plan_info = Some(read_clean_plan_info(&mut c)?);
    }
    if has(SECTION_MAP_INFO_LIST) {
        data.map_info_list = Some(read_map_info_list(&mut c)?);
    }
    if has(SECTION_ROOMS) {
        data.rooms = Some(read_room_section(&mut c)?);
    }

    Ok(data)
}

/// Decode `RMSG_AREA_LIST_INFO` (fixed block order, no mask).
pub fn decode_area_list(payload: &[u8]) -> Result<AreaListData> {
    let raw = inflate(payload)?;
    let mut c = ByteCursor::new(&raw);

    let header = AreaListHeader {
        unk1: c.read_u32()?,
        map_head_id: c.read_u32()?,
        unk2: c.read_u32()?,
        unk3: c.read_u32()?,
    };
    let map_head_info = read_map_head_info(&mut c)?;
    let map_grid = read_grid(&mut c, &map_head_info)?;
    let clean_plan_info = read_clean_plan_info(&mut c)?;
    let map_info_list = read_map_info_list(&mut c)?;
    let clean_room_list = read_clean_room_list(&mut c)?;
    let clean_plan_list = read_clean_plan_list(&mut c)?;

    Ok(AreaListData {
        header,
        map_head_info,
        map_grid,
        clean_plan_info,
        map_info_list,
        clean_room_list,
        clean_plan_list,
    })
}

/// Decode `RMSG_UPDATE_ROBOT_POSITION` (uncompressed).
pub fn decode_robot_pose(payload: &[u8]) -> Result<RobotPose> {
    read_robot_pose(&mut ByteCursor::new(payload))
}

/// Decode `RMSG_UPDATE_CHARGE_POSITION` (uncompressed).
pub fn decode_charger_pose(payload: &[u8]) -> Result<ChargerPose> {
    read_charger_pose(&mut ByteCursor::new(payload))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Write;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    use super::*;

    fn zlib(raw: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(raw).unwrap();
        enc.finish().unwrap()
    }

    fn u32s(out: &mut Vec<u8>, vals: &[u32]) {
        for v in vals {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn f32s(out: &mut Vec<u8>, vals: &[f32]) {
        for v in vals {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    #[test]
    fn not_zlib_is_corrupt() {
        let err = decode_map(b"definitely not zlib").unwrap_err();
        assert!(matches!(err, BridgeError::CorruptMapPayload(_)));
    }

    #[test]
    fn inflate_stops_at_the_limit() {
        let bomb = zlib(&[0u8; 4096]);
        assert_eq!(inflate_limited(&bomb, 4096).unwrap().len(), 4096);
        let err = inflate_limited(&bomb, 4095).unwrap_err();
        assert!(matches!(err, BridgeError::CorruptMapPayload(_)));
    }

    #[test]
    fn empty_mask_yields_no_sections() {
        let data = decode_map(&zlib(&0u32.to_le_bytes())).unwrap();
        assert_eq!(data, MapData::default());
    }

    #[test]
    fn history_points_are_skipped_opaquely() {
        let mut raw = Vec::new();
        u32s(&mut raw, &[SECTION_HISTORY | SECTION_CHARGER, 3, 2, 11]);
        raw.extend_from_slice(&[0xEE; 18]);
        u32s(&mut raw, &[5]);
        f32s(&mut raw, &[1.0, 2.0, 0.5]);

        let data = decode_map(&zlib(&raw)).unwrap();
        assert_eq!(data.history_head_info.unwrap().point_number, 2);
        assert_eq!(data.history_points.unwrap().len(), 18);
        let charger = data.charger_pose.unwrap();
        assert_eq!(charger.id, 5);
        assert_eq!(charger.pose_y, 2.0);
    }

    #[test]
    fn unhandled_bits_fail() {
        for bit in SECTIONS_UNHANDLED {
            let err = decode_map(&zlib(&bit.to_le_bytes())).unwrap_err();
            assert!(matches!(err, BridgeError::UnhandledMapSection(b) if b == bit));
        }
    }

    #[test]
    fn truncated_section_is_an_error() {
        let mut raw = Vec::new();
        u32s(&mut raw, &[SECTION_STATUS, 1, 2, 3]);
        let err = decode_map(&zlib(&raw)).unwrap_err();
        assert!(matches!(err, BridgeError::UnexpectedEof { .. }));
    }

    #[test]
    fn room_section_with_enable_info_is_unsupported() {
        let mut raw = Vec::new();
        u32s(&mut raw, &[SECTION_ROOMS, 0]); // mask, no rooms
        raw.push(0); // no plans
        u32s(&mut raw, &[1]);
        raw.push(2); // room enable size
        let err = decode_map(&zlib(&raw)).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedRoomEnableInfo(2)));
    }

    #[test]
    fn pose_updates_are_uncompressed() {
        let mut raw = Vec::new();
        u32s(&mut raw, &[4, 8]);
        raw.push(1);
        f32s(&mut raw, &[-1.5, 2.5, 0.25]);
        let pose = decode_robot_pose(&raw).unwrap();
        assert_eq!(pose.map_head_id, 4);
        assert_eq!(pose.pose_id, 8);
        assert_eq!(pose.update, 1);
        assert_eq!(pose.pose_x, -1.5);

        let mut raw = Vec::new();
        u32s(&mut raw, &[2]);
        f32s(&mut raw, &[0.0, 1.0, 3.0]);
        assert_eq!(decode_charger_pose(&raw).unwrap().pose_phi, 3.0);
        assert!(decode_charger_pose(&raw[..10]).is_err());
    }
}
