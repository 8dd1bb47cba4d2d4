use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::sync::Mutex;

use congabridge_core::error::Result;
use congabridge_core::model::{Device, DeviceStatus, FanSpeed, MapModel, RobotState};
use congabridge_core::protocol::map::{ChargerPose, MapData, RobotPose};
use congabridge_core::protocol::messages::{
    CleanArea, CleanAreaEntry, CleanMode, Coordinate, DeviceStatusReport, MapInfoRequest,
    ReturnHome, SetArea, SetFanMode, SetPosition, Unk2,
};
use congabridge_core::protocol::{Command, Message, Opcode};

use crate::config::HandshakeSection;
use crate::session::observer::StateObserver;
use crate::transport::CommandChannel;

/// Device ids minted at signup fall in `1..=DEVICE_ID_MAX`.
const DEVICE_ID_MAX: u32 = 100_000_000;
/// Bridge user id and clean-area ids fall in `1..=RANDOM_ID_MAX`.
const RANDOM_ID_MAX: u32 = 1_000_000;

const CLEAN_MODE_START: u32 = 1;
const CLEAN_MODE_STOP: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Unregistered,
    Registered,
    LoggedIn,
    Active,
}

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    device: Option<Device>,
    status: DeviceStatus,
    map: MapModel,
}

/// Point-in-time copy of the session for callers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub device: Option<Device>,
    pub connected: bool,
    pub state: RobotState,
    pub raw: DeviceStatus,
}

/// Outcome of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoginOutcome {
    Accepted,
    Rejected,
}

pub struct DeviceSession {
    cmd: Arc<CommandChannel>,
    user_id: u32,
    handshake: HandshakeSection,
    observer: Arc<dyn StateObserver>,
    state: Mutex<SessionState>,
}

impl DeviceSession {
    pub fn new(
        cmd: Arc<CommandChannel>,
        handshake: HandshakeSection,
        observer: Arc<dyn StateObserver>,
    ) -> Self {
        let user_id = rand::thread_rng().gen_range(1..=RANDOM_ID_MAX);
        tracing::info!(user_id, "bridge identity minted");
        Self {
            cmd,
            user_id,
            handshake,
            observer,
            state: Mutex::new(SessionState {
                phase: SessionPhase::Unregistered,
                device: None,
                status: DeviceStatus::default(),
                map: MapModel::default(),
            }),
        }
    }

    /// Bridge user id adopted on login.
    pub fn user_id(&self) -> u32 {
        self.user_id
    }

    pub fn command_channel(&self) -> &Arc<CommandChannel> {
        &self.cmd
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    pub async fn device(&self) -> Option<Device> {
        self.state.lock().await.device.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let connected = self.cmd.is_connected().await;
        let st = self.state.lock().await;
        SessionSnapshot {
            phase: st.phase,
            device: st.device.clone(),
            connected,
            state: st.status.robot_state(),
            raw: st.status.clone(),
        }
    }

    pub async fn map(&self) -> MapModel {
        self.state.lock().await.map.clone()
    }

    pub fn fan_speeds(&self) -> [FanSpeed; 4] {
        FanSpeed::ALL
    }

    // ---- registration ----

    /// Register (or re-register) the appliance; returns its id.
    pub(crate) async fn signup(&self, serial_number: &str, software_version: &str) -> u32 {
        let mut st = self.state.lock().await;
        let known = st
            .device
            .as_ref()
            .filter(|d| d.serial_number == serial_number)
            .map(|d| d.id);
        if let Some(id) = known {
            tracing::info!(id, serial = serial_number, "device signed up again");
            if st.phase == SessionPhase::Unregistered {
                st.phase = SessionPhase::Registered;
            }
            return id;
        }

        let id = rand::thread_rng().gen_range(1..=DEVICE_ID_MAX);
        tracing::info!(id, serial = serial_number, version = software_version, "device registered");
        st.device = Some(Device {
            id,
            serial_number: serial_number.to_string(),
            software_version: software_version.to_string(),
        });
        st.phase = SessionPhase::Registered;
        id
    }

    pub(crate) async fn login(&self, device_id: u32) -> LoginOutcome {
        let mut st = self.state.lock().await;
        if !st.device.as_ref().is_some_and(|d| d.id == device_id) {
            return LoginOutcome::Rejected;
        }
        st.phase = SessionPhase::LoggedIn;
        LoginOutcome::Accepted
    }

    /// Post-login sequence: device check, connect, time sync, then ask for the map.
    pub(crate) async fn run_handshake(&self) -> Result<()> {
        self.cmd.send_command(Command::DeviceCheck, None).await?;
        self.cmd.send(Opcode::QConnectDevice, None).await?;
        let unk2 = Message::Unk2(Unk2 {
            unk1: 0,
            unk2: String::new(),
        });
        self.cmd.send_command(Command::Unk2, Some(&unk2)).await?;
        self.cmd.send_command(Command::DeviceTime, None).await?;

        tokio::time::sleep(Duration::from_millis(self.handshake.map_info_delay_ms)).await;

        let req = Message::MapInfoRequest(MapInfoRequest {
            mask: self.handshake.map_info_mask,
        });
        self.cmd.send_command(Command::MapInfo, Some(&req)).await?;

        self.state.lock().await.phase = SessionPhase::Active;
        tracing::info!("handshake complete");
        Ok(())
    }

    // ---- telemetry ----

    pub(crate) async fn apply_battery(&self, level: u32) {
        let state = {
            let mut st = self.state.lock().await;
            st.status.apply_battery(level);
            st.status.robot_state()
        };
        self.observer.status_changed(&state);
    }

    pub(crate) async fn apply_status(&self, report: &DeviceStatusReport) {
        let state = {
            let mut st = self.state.lock().await;
            st.status.apply_report(report);
            st.status.robot_state()
        };
        self.observer.status_changed(&state);
    }

    pub(crate) async fn apply_map(&self, data: &MapData) {
        self.state.lock().await.map.apply(data);
        self.observer.map_changed();
    }

    pub(crate) async fn update_robot(&self, pose: &RobotPose) {
        self.state.lock().await.map.update_robot(pose);
        self.observer.map_changed();
    }

    pub(crate) async fn update_charger(&self, pose: &ChargerPose) {
        self.state.lock().await.map.update_charger(pose);
        self.observer.map_changed();
    }

    // ---- commands ----

    async fn command(&self, command: Command, msg: Option<Message>) -> Result<()> {
        tracing::info!(command = command.as_str(), "command");
        self.cmd.send_command(command, msg.as_ref()).await.map(drop)
    }

    pub async fn locate(&self) -> Result<()> {
        self.command(Command::LocateDevice, None).await
    }

    pub async fn return_home(&self) -> Result<()> {
        self.command(Command::ReturnHome, Some(Message::ReturnHome(ReturnHome { unk1: 1 })))
            .await
    }

    pub async fn start_cleaning(&self) -> Result<()> {
        self.clean_mode(CLEAN_MODE_START).await
    }

    pub async fn pause_cleaning(&self) -> Result<()> {
        self.clean_mode(CLEAN_MODE_STOP).await
    }

    pub async fn stop_cleaning(&self) -> Result<()> {
        self.clean_mode(CLEAN_MODE_STOP).await
    }

    async fn clean_mode(&self, mode: u32) -> Result<()> {
        let msg = Message::CleanMode(CleanMode { mode, unk1: 2 });
        self.command(Command::CleanMode, Some(msg)).await
    }

    pub async fn set_fan_speed(&self, speed: FanSpeed) -> Result<()> {
        let msg = Message::SetFanMode(SetFanMode { mode: speed.mode() });
        self.command(Command::SetFanMode, Some(msg)).await
    }

    /// Drive to a point given in scaled map pixels.
    pub async fn go_to(&self, x: f32, y: f32) -> Result<()> {
        let (map_head_id, target) = {
            let st = self.state.lock().await;
            (st.map.id, st.map.scaled_to_world(x, y))
        };
        let msg = Message::SetPosition(SetPosition {
            map_head_id,
            pose_x: target.x,
            pose_y: target.y,
            pose_phi: 0.0,
            update: 1,
        });
        self.command(Command::SetPosition, Some(msg)).await
    }

    /// Clean rectangles given as `[x1, y1, x2, y2]` in scaled map pixels.
    pub async fn clean_zones(&self, zones: &[[f32; 4]]) -> Result<()> {
        let area = {
            let st = self.state.lock().await;
            let mut rng = rand::thread_rng();
            let clean_area_list = zones
                .iter()
                .map(|zone| {
                    let corners = st.map.zone_corners(*zone);
                    CleanAreaEntry {
                        clean_area_id: rng.gen_range(1..=RANDOM_ID_MAX),
                        unk1: 0,
                        coordinate_length: corners.len() as u32,
                        coordinate_list: corners
                            .iter()
                            .map(|p| Coordinate { x: p.x, y: p.y })
                            .collect(),
                    }
                })
                .collect::<Vec<_>>();
            SetArea {
                map_head_id: st.map.id,
                unk1: 0,
                clean_area_length: clean_area_list.len() as u32,
                clean_area_list,
            }
        };

        self.command(Command::SetArea, Some(Message::SetArea(area))).await?;
        self.command(Command::CleanArea, Some(Message::CleanArea(CleanArea { unk1: 1 })))
            .await
    }
}
