//! congabridge: local stand-in for the vacuum's cloud service.
//!
//! - Device listeners on `bridge.cmd_listen` / `bridge.map_listen`
//! - Optional HTTP control surface on `api.listen`
//! - Config path from the first argument (default `congabridge.yaml`)

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use congabridge_core::error::Result;
use congabridge_gateway::session::TracingObserver;
use congabridge_gateway::{app_state, config, router, Bridge};

const DEFAULT_CONFIG: &str = "congabridge.yaml";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, class = e.class().as_str(), "congabridge failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = config::load_from_file(&path)?;

    let bridge = Bridge::start(&cfg, Arc::new(TracingObserver)).await?;

    if cfg.api.enabled {
        let listen = cfg.api.addr()?;
        let state = app_state::AppState::new(&cfg, bridge.session());
        let app = router::build_router(state);

        tracing::info!(%listen, "api starting");
        let listener = tokio::net::TcpListener::bind(listen).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        shutdown_signal().await;
    }

    bridge.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
