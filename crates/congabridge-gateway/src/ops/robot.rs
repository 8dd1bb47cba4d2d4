//! Robot state and command endpoints.
//!
//! Commands wait for the device's reply, bounded by `api.command_timeout_ms`.

use std::future::Future;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use congabridge_core::error::{BridgeError, ErrorClass, Result};
use congabridge_core::model::FanSpeed;

use crate::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct FanSpeedBody {
    pub level: FanSpeed,
}

#[derive(Debug, Deserialize)]
pub struct GoToBody {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Deserialize)]
pub struct ZonesBody {
    /// `[x1, y1, x2, y2]` in scaled map pixels.
    pub zones: Vec<[f32; 4]>,
}

fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::Transport => StatusCode::SERVICE_UNAVAILABLE,
        ErrorClass::Protocol => StatusCode::GATEWAY_TIMEOUT,
        ErrorClass::Framing => StatusCode::BAD_GATEWAY,
        ErrorClass::Config => StatusCode::BAD_REQUEST,
        ErrorClass::Decode | ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: &BridgeError) -> Response {
    let class = e.class();
    let body = json!({
        "code": class.as_str(),
        "msg": e.to_string(),
    });
    (status_for(class), Json(body)).into_response()
}

async fn bounded<F>(state: &AppState, name: &'static str, fut: F) -> Response
where
    F: Future<Output = Result<()>>,
{
    match tokio::time::timeout(state.command_timeout(), fut).await {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({ "ok": true }))).into_response(),
        Ok(Err(e)) => {
            tracing::warn!(command = name, error = %e, "command failed");
            error_response(&e)
        }
        Err(_) => {
            tracing::warn!(command = name, "command timed out");
            error_response(&BridgeError::Timeout(name))
        }
    }
}

pub async fn state(State(state): State<AppState>) -> Response {
    Json(state.session().snapshot().await).into_response()
}

pub async fn map(State(state): State<AppState>) -> Response {
    Json(state.session().map().await).into_response()
}

pub async fn fan_speeds(State(state): State<AppState>) -> Response {
    Json(state.session().fan_speeds()).into_response()
}

pub async fn locate(State(state): State<AppState>) -> Response {
    bounded(&state, "LOCATE_DEVICE", state.session().locate()).await
}

pub async fn home(State(state): State<AppState>) -> Response {
    bounded(&state, "RETURN_HOME", state.session().return_home()).await
}

pub async fn clean_start(State(state): State<AppState>) -> Response {
    bounded(&state, "CLEAN_MODE", state.session().start_cleaning()).await
}

pub async fn clean_pause(State(state): State<AppState>) -> Response {
    bounded(&state, "CLEAN_MODE", state.session().pause_cleaning()).await
}

pub async fn clean_stop(State(state): State<AppState>) -> Response {
    bounded(&state, "CLEAN_MODE", state.session().stop_cleaning()).await
}

pub async fn set_fan_speed(State(state): State<AppState>, Json(body): Json<FanSpeedBody>) -> Response {
    bounded(&state, "SET_FAN_MODE", state.session().set_fan_speed(body.level)).await
}

pub async fn go_to(State(state): State<AppState>, Json(body): Json<GoToBody>) -> Response {
    bounded(&state, "SET_POSITION", state.session().go_to(body.x, body.y)).await
}

pub async fn clean_zones(State(state): State<AppState>, Json(body): Json<ZonesBody>) -> Response {
    if body.zones.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "code": "BAD_REQUEST", "msg": "zones must not be empty" })),
        )
            .into_response();
    }
    bounded(&state, "SET_AREA", state.session().clean_zones(&body.zones)).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn classes_map_to_statuses() {
        assert_eq!(
            status_for(BridgeError::NotConnected.class()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(BridgeError::Timeout("LOCATE_DEVICE").class()),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[tokio::test]
    async fn commands_are_cut_off_at_the_configured_timeout() {
        use std::sync::Arc;
        use std::time::Duration;

        use crate::session::{DeviceSession, TracingObserver};
        use crate::transport::CommandChannel;

        let cfg = crate::config::load_from_str("version: 1\napi:\n  command_timeout_ms: 100\n")
            .unwrap();
        let session = DeviceSession::new(
            Arc::new(CommandChannel::new("cmd")),
            cfg.handshake.clone(),
            Arc::new(TracingObserver),
        );
        let state = AppState::new(&cfg, Arc::new(session));
        assert_eq!(state.command_timeout(), Duration::from_millis(100));

        let never = std::future::pending::<Result<()>>();
        let resp = bounded(&state, "LOCATE_DEVICE", never).await;
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);

        let resp = bounded(&state, "LOCATE_DEVICE", state.session().locate()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn bodies_parse() {
        let b: FanSpeedBody = serde_json::from_str(r#"{"level":"medium"}"#).unwrap();
        assert_eq!(b.level, FanSpeed::Medium);

        let z: ZonesBody = serde_json::from_str(r#"{"zones":[[1,2,3,4]]}"#).unwrap();
        assert_eq!(z.zones, vec![[1.0, 2.0, 3.0, 4.0]]);

        assert!(serde_json::from_str::<FanSpeedBody>(r#"{"level":"turbo"}"#).is_err());
    }
}
