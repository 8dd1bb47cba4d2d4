//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/v1/robot/*` : state snapshots and device commands (`robot`)

pub mod robot;

use axum::{http::StatusCode, response::IntoResponse};

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
