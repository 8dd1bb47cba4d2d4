//! Bridge assembly: both device listeners, the session and its dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use congabridge_core::error::Result;

use crate::config::BridgeConfig;
use crate::session::{build_dispatcher, DeviceSession, StateObserver};
use crate::transport::{self, CommandChannel};

/// A running bridge. Dropping it leaves the listeners running; call
/// `shutdown` to stop them.
pub struct Bridge {
    cmd_addr: SocketAddr,
    map_addr: SocketAddr,
    cmd: Arc<CommandChannel>,
    map: Arc<CommandChannel>,
    session: Arc<DeviceSession>,
    tasks: Vec<JoinHandle<()>>,
}

impl Bridge {
    /// Bind both listeners and start accepting devices.
    pub async fn start(cfg: &BridgeConfig, observer: Arc<dyn StateObserver>) -> Result<Self> {
        let cmd_listener = TcpListener::bind(cfg.bridge.cmd_addr()?).await?;
        let map_listener = TcpListener::bind(cfg.bridge.map_addr()?).await?;
        let cmd_addr = cmd_listener.local_addr()?;
        let map_addr = map_listener.local_addr()?;

        let cmd = Arc::new(CommandChannel::new("cmd"));
        let map = Arc::new(CommandChannel::new("map"));
        let session = Arc::new(DeviceSession::new(
            Arc::clone(&cmd),
            cfg.handshake.clone(),
            observer,
        ));
        let dispatcher = Arc::new(build_dispatcher(&session));
        let max_frame_bytes = cfg.bridge.max_frame_bytes;

        let tasks = vec![
            tokio::spawn(transport::serve(
                cmd_listener,
                Arc::clone(&cmd),
                Arc::clone(&dispatcher),
                max_frame_bytes,
            )),
            tokio::spawn(transport::serve(
                map_listener,
                Arc::clone(&map),
                dispatcher,
                max_frame_bytes,
            )),
        ];

        tracing::info!(%cmd_addr, %map_addr, "bridge started");
        Ok(Self {
            cmd_addr,
            map_addr,
            cmd,
            map,
            session,
            tasks,
        })
    }

    pub fn cmd_addr(&self) -> SocketAddr {
        self.cmd_addr
    }

    pub fn map_addr(&self) -> SocketAddr {
        self.map_addr
    }

    pub fn session(&self) -> Arc<DeviceSession> {
        Arc::clone(&self.session)
    }

    /// Stop accepting and close both device connections.
    pub async fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        self.cmd.close().await;
        self.map.close().await;
        tracing::info!("bridge stopped");
    }
}
