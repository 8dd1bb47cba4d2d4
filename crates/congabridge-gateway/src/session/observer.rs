use congabridge_core::model::RobotState;

/// Receives state change notifications after each telemetry update.
///
/// Called from the connection reader, outside the session lock. Keep
/// implementations short; anything slow belongs on its own task.
pub trait StateObserver: Send + Sync {
    fn status_changed(&self, state: &RobotState);
    fn map_changed(&self);
}

/// Default observer: logs every change.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StateObserver for TracingObserver {
    fn status_changed(&self, state: &RobotState) {
        tracing::info!(
            status = ?state.status,
            flag = ?state.status_flag,
            battery = state.battery.level,
            fan = ?state.fan_speed,
            "robot status changed"
        );
    }

    fn map_changed(&self) {
        tracing::debug!("robot map changed");
    }
}
