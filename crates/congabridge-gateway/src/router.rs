//! Axum router wiring (operational + robot control endpoints).

use axum::{
    routing::{get, put},
    Router,
};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/v1/robot/state", get(ops::robot::state))
        .route("/v1/robot/map", get(ops::robot::map))
        .route("/v1/robot/fan_speeds", get(ops::robot::fan_speeds))
        .route("/v1/robot/locate", put(ops::robot::locate))
        .route("/v1/robot/home", put(ops::robot::home))
        .route("/v1/robot/clean/start", put(ops::robot::clean_start))
        .route("/v1/robot/clean/pause", put(ops::robot::clean_pause))
        .route("/v1/robot/clean/stop", put(ops::robot::clean_stop))
        .route("/v1/robot/fan_speed", put(ops::robot::set_fan_speed))
        .route("/v1/robot/goto", put(ops::robot::go_to))
        .route("/v1/robot/zones", put(ops::robot::clean_zones))
        .with_state(state)
}
