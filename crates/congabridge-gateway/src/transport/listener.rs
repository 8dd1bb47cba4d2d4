//! Accept loop and per-connection reader.

use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpListener;
use tracing::Instrument;

use congabridge_core::protocol::FrameReassembler;

use crate::dispatch::Dispatcher;
use crate::transport::channel::{CommandChannel, Connection};

const READ_CHUNK: usize = 16 * 1024;

/// Accept device connections forever. A new connection replaces the
/// current one on this channel.
pub async fn serve(
    listener: TcpListener,
    channel: Arc<CommandChannel>,
    dispatcher: Arc<Dispatcher>,
    max_frame_bytes: usize,
) {
    let port = listener.local_addr().map(|a| a.port()).unwrap_or_default();
    tracing::info!(channel = channel.name(), port, "listening for device");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(channel = channel.name(), port, error = %e, "accept failed");
                continue;
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "set_nodelay failed");
        }

        let (rd, wr) = stream.into_split();
        let conn = Arc::new(Connection::new(
            channel.next_connection_id(),
            port,
            peer,
            Box::new(wr),
        ));
        tracing::info!(channel = channel.name(), port, %peer, conn = conn.id(), "device connected");

        let span = tracing::info_span!("device", channel = channel.name(), port, %peer, conn = conn.id());
        let reader = read_loop(
            rd,
            Arc::clone(&conn),
            Arc::clone(&channel),
            Arc::clone(&dispatcher),
            max_frame_bytes,
        )
        .instrument(span);

        channel
            .replace(conn, || tokio::spawn(reader).abort_handle())
            .await;
    }
}

async fn read_loop(
    mut rd: OwnedReadHalf,
    conn: Arc<Connection>,
    channel: Arc<CommandChannel>,
    dispatcher: Arc<Dispatcher>,
    max_frame_bytes: usize,
) {
    let mut reassembler = FrameReassembler::new(max_frame_bytes);
    let mut buf = BytesMut::with_capacity(READ_CHUNK);

    loop {
        buf.clear();
        match rd.read_buf(&mut buf).await {
            Ok(0) => {
                tracing::info!(pending = reassembler.pending(), "device disconnected");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "read failed");
                break;
            }
        }

        let packets = match reassembler.push(&buf) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, class = e.class().as_str(), "framing error, dropping connection");
                break;
            }
        };

        for packet in packets {
            if let Err(e) = dispatcher.dispatch(&conn, packet).await {
                tracing::warn!(error = %e, class = e.class().as_str(), "packet dropped");
            }
        }
    }

    conn.close().await;
    channel.detach(conn.id()).await;
}
