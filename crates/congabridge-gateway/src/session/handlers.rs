//! Inbound packet handlers.

use std::sync::Arc;

use async_trait::async_trait;

use congabridge_core::error::Result;
use congabridge_core::protocol::messages::{
    DeviceStatusReport, LoginReply, SignupDevice, SignupReply, SignupRequest,
};
use congabridge_core::protocol::{Command, DecodedPayload, Message, Opcode};

use crate::dispatch::{Dispatcher, OpcodeHandler, PacketCtx};
use crate::session::device_session::{DeviceSession, LoginOutcome};

/// Login rejection code for an unknown device.
const LOGIN_NOT_REGISTERED: u32 = 12002;

/// Wire every handler to `session`.
pub fn build_dispatcher(session: &Arc<DeviceSession>) -> Dispatcher {
    let dispatcher = Dispatcher::new();
    dispatcher.register(Arc::new(RegistrationHandler(Arc::clone(session))));
    dispatcher.register(Arc::new(TelemetryHandler(Arc::clone(session))));
    dispatcher.register(Arc::new(MapHandler(Arc::clone(session))));
    dispatcher.register(Arc::new(KeepaliveHandler(Arc::clone(session))));
    dispatcher
}

fn message(payload: Option<DecodedPayload>) -> Option<Message> {
    match payload {
        Some(DecodedPayload::Message(m)) => Some(m),
        _ => None,
    }
}

/// Signup and login.
pub struct RegistrationHandler(Arc<DeviceSession>);

#[async_trait]
impl OpcodeHandler for RegistrationHandler {
    fn opcodes(&self) -> &'static [Opcode] {
        &[Opcode::QDeviceSignup, Opcode::QDeviceLogin]
    }

    async fn handle(&self, ctx: PacketCtx, payload: Option<DecodedPayload>) -> Result<()> {
        // empty bodies decode to nothing; treat their fields as blank
        match (ctx.packet.op(), message(payload)) {
            (Some(Opcode::QDeviceSignup), msg) => {
                let req = match msg {
                    Some(Message::SignupRequest(req)) => req,
                    _ => SignupRequest::default(),
                };
                self.signup(ctx, req).await
            }
            (_, msg) => {
                let serial = match msg {
                    Some(Message::LoginRequest(req)) => req.device_serial_number,
                    _ => String::new(),
                };
                self.login(ctx, serial).await
            }
        }
    }
}

impl RegistrationHandler {
    async fn signup(&self, ctx: PacketCtx, req: SignupRequest) -> Result<()> {
        let id = self
            .0
            .signup(&req.device_serial_number, &req.software_version)
            .await;
        let reply = Message::SignupReply(SignupReply {
            result: 0,
            device: Some(SignupDevice { id }),
        });
        ctx.reply(Opcode::RDeviceSignup, Some(&reply)).await
    }

    async fn login(&self, ctx: PacketCtx, serial: String) -> Result<()> {
        let session = &self.0;
        let device_id = ctx.packet.device_id;

        if session.login(device_id).await == LoginOutcome::Rejected {
            tracing::warn!(device_id, serial = %serial, "login rejected");
            let reply = Message::LoginReply(LoginReply {
                result: LOGIN_NOT_REGISTERED,
                reason: format!("Device not registered(devsn: {serial})"),
            });
            return ctx.reply(Opcode::RDeviceLogin, Some(&reply)).await;
        }

        session
            .command_channel()
            .set_addressing(session.user_id(), device_id)
            .await;
        let reply = Message::LoginReply(LoginReply {
            result: 0,
            reason: String::new(),
        });
        ctx.reply(Opcode::RDeviceLogin, Some(&reply)).await?;
        tracing::info!(device_id, serial = %serial, "device logged in");

        let session = Arc::clone(session);
        tokio::spawn(async move {
            if let Err(e) = session.run_handshake().await {
                tracing::warn!(error = %e, class = e.class().as_str(), "handshake aborted");
            }
        });
        Ok(())
    }
}

/// Battery and status reports.
pub struct TelemetryHandler(Arc<DeviceSession>);

#[async_trait]
impl OpcodeHandler for TelemetryHandler {
    fn opcodes(&self) -> &'static [Opcode] {
        &[Opcode::QBatteryLevel, Opcode::QDeviceStatus]
    }

    async fn handle(&self, ctx: PacketCtx, payload: Option<DecodedPayload>) -> Result<()> {
        let session = &self.0;
        // an all-zero report arrives as an empty body
        match (ctx.packet.op(), message(payload)) {
            (Some(Opcode::QBatteryLevel), msg) => {
                let level = match msg {
                    Some(Message::BatteryLevel(report)) => report.battery.map(|b| b.level),
                    _ => None,
                };
                session.apply_battery(level.unwrap_or_default()).await;
                ctx.reply(Opcode::RBatteryLevel, Some(&Message::ok())).await
            }
            (_, msg) => {
                let report = match msg {
                    Some(Message::DeviceStatus(report)) => report,
                    _ => DeviceStatusReport::default(),
                };
                session
                    .command_channel()
                    .set_addressing(ctx.packet.user_id, ctx.packet.device_id)
                    .await;
                session.apply_status(&report).await;
                Ok(())
            }
        }
    }
}

/// Map snapshots, incremental updates and marker positions.
pub struct MapHandler(Arc<DeviceSession>);

#[async_trait]
impl OpcodeHandler for MapHandler {
    fn opcodes(&self) -> &'static [Opcode] {
        &[
            Opcode::RMapInfo,
            Opcode::RMapUpdate,
            Opcode::RUpdateRobotPosition,
            Opcode::RUpdateChargePosition,
            Opcode::RAreaListInfo,
        ]
    }

    async fn handle(&self, _ctx: PacketCtx, payload: Option<DecodedPayload>) -> Result<()> {
        let session = &self.0;
        match payload {
            Some(DecodedPayload::Map(data)) => session.apply_map(&data).await,
            Some(DecodedPayload::RobotPose(pose)) => session.update_robot(&pose).await,
            Some(DecodedPayload::ChargerPose(pose)) => session.update_charger(&pose).await,
            Some(DecodedPayload::AreaList(list)) => {
                tracing::info!(
                    map = list.header.map_head_id,
                    rooms = list.clean_room_list.len(),
                    plans = list.clean_plan_list.len(),
                    "area list received"
                );
            }
            Some(DecodedPayload::Message(_)) | None => {}
        }
        Ok(())
    }
}

/// Ping and the informational requests that only need an acknowledgement.
pub struct KeepaliveHandler(Arc<DeviceSession>);

#[async_trait]
impl OpcodeHandler for KeepaliveHandler {
    fn opcodes(&self) -> &'static [Opcode] {
        &[
            Opcode::QPing,
            Opcode::QDeviceInfo,
            Opcode::QDeviceVersion,
            Opcode::QDeviceOta,
            // the device opens this exchange with the reply opcode
            Opcode::RUnk1,
        ]
    }

    async fn handle(&self, ctx: PacketCtx, _payload: Option<DecodedPayload>) -> Result<()> {
        let ack = match ctx.packet.op() {
            Some(Opcode::QPing) => {
                ctx.reply(Opcode::RPing, None).await?;
                let session = Arc::clone(&self.0);
                tokio::spawn(async move {
                    let cmd = session.command_channel();
                    if let Err(e) = cmd.send_command(Command::DeviceCheck, None).await {
                        tracing::debug!(error = %e, "device check after ping failed");
                    }
                });
                return Ok(());
            }
            Some(Opcode::QDeviceInfo) => Opcode::RDeviceInfo,
            Some(Opcode::QDeviceVersion) => Opcode::RDeviceVersion,
            Some(Opcode::QDeviceOta) => Opcode::RDeviceOta,
            Some(Opcode::RUnk1) => Opcode::RUnk1,
            _ => return Ok(()),
        };
        ctx.reply(ack, Some(&Message::ok())).await
    }
}
