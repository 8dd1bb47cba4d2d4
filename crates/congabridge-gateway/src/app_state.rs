//! Shared state for the HTTP surface.

use std::sync::Arc;
use std::time::Duration;

use crate::config::BridgeConfig;
use crate::session::DeviceSession;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    command_timeout: Duration,
    session: Arc<DeviceSession>,
}

impl AppState {
    pub fn new(cfg: &BridgeConfig, session: Arc<DeviceSession>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                command_timeout: Duration::from_millis(cfg.api.command_timeout_ms),
                session,
            }),
        }
    }

    pub fn session(&self) -> &DeviceSession {
        &self.inner.session
    }

    /// Upper bound on a device command issued over HTTP.
    pub fn command_timeout(&self) -> Duration {
        self.inner.command_timeout
    }
}
