//! One live device connection per listener, and the command channel on top.
//!
//! Outbound requests are stamped by the connection's `PacketBuilder` under the
//! same lock as the socket write, so sequence numbers hit the wire in order.
//! Replies to commands are correlated by reply opcode only: at most one
//! command of a given type is expected to be in flight.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{oneshot, Mutex};
use tokio::task::AbortHandle;

use congabridge_core::error::{BridgeError, Result};
use congabridge_core::protocol::{
    encode_packet, Command, Message, Opcode, Packet, PacketBuilder, PayloadCodec,
};

/// Write half of a device socket.
pub type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

struct Outbound {
    writer: BoxWriter,
    builder: PacketBuilder,
}

/// One accepted device socket.
pub struct Connection {
    id: u64,
    port: u16,
    peer: SocketAddr,
    out: Mutex<Outbound>,
    waiters: DashMap<Opcode, Vec<oneshot::Sender<Packet>>>,
    closed: AtomicBool,
}

impl Connection {
    pub fn new(id: u64, port: u16, peer: SocketAddr, writer: BoxWriter) -> Self {
        Self {
            id,
            port,
            peer,
            out: Mutex::new(Outbound {
                writer,
                builder: PacketBuilder::new(),
            }),
            waiters: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Adopt the addressing stamped on every later request.
    pub async fn set_addressing(&self, user_id: u32, device_id: u32) {
        let mut out = self.out.lock().await;
        out.builder.set_user_id(user_id);
        out.builder.set_device_id(device_id);
    }

    /// Build and write a request with the next sequence number.
    pub async fn send(&self, op: Opcode, msg: Option<&Message>) -> Result<Packet> {
        if self.is_closed() {
            return Err(BridgeError::ConnectionClosed);
        }
        // validate before the sequence advances
        let payload = PayloadCodec::encode(op, msg)?;

        let mut out = self.out.lock().await;
        let packet = out.builder.build(op, payload);
        out.writer.write_all(&encode_packet(&packet)).await?;
        tracing::debug!(port = self.port, %packet, "send");
        Ok(packet)
    }

    /// Write an already built packet (replies keep the request's sequence).
    pub async fn write_packet(&self, packet: &Packet) -> Result<()> {
        if self.is_closed() {
            return Err(BridgeError::ConnectionClosed);
        }
        let mut out = self.out.lock().await;
        out.writer.write_all(&encode_packet(packet)).await?;
        tracing::debug!(port = self.port, %packet, "send");
        Ok(())
    }

    /// Register interest in the next packet carrying `op`.
    pub fn expect(&self, op: Opcode) -> oneshot::Receiver<Packet> {
        let (tx, rx) = oneshot::channel();
        let mut waiters = self.waiters.entry(op).or_default();
        waiters.retain(|w| !w.is_closed());
        waiters.push(tx);
        rx
    }

    /// Drop waiters on `op` whose receiver is gone.
    pub fn forget_abandoned(&self, op: Opcode) {
        self.waiters.remove_if_mut(&op, |_, waiters| {
            waiters.retain(|w| !w.is_closed());
            waiters.is_empty()
        });
    }

    #[cfg(test)]
    fn waiting(&self, op: Opcode) -> usize {
        self.waiters.get(&op).map_or(0, |w| w.len())
    }

    /// Hand an inbound packet to everyone waiting on its opcode.
    /// Returns how many waiters were resolved.
    pub fn deliver(&self, op: Opcode, packet: &Packet) -> usize {
        let Some((_, waiters)) = self.waiters.remove(&op) else {
            return 0;
        };
        waiters
            .into_iter()
            .map(|tx| tx.send(packet.clone()).is_ok())
            .filter(|sent| *sent)
            .count()
    }

    /// Mark closed, fail pending waiters, shut the write side down.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.waiters.clear();
        let mut out = self.out.lock().await;
        if let Err(e) = out.writer.shutdown().await {
            tracing::debug!(port = self.port, error = %e, "shutdown after close");
        }
    }
}

struct Live {
    conn: Arc<Connection>,
    reader: AbortHandle,
}

/// Listener-scoped channel: at most one live connection at a time.
pub struct CommandChannel {
    name: &'static str,
    current: Mutex<Option<Live>>,
    next_id: AtomicU64,
}

impl CommandChannel {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn next_connection_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Tear down the current connection (if any), then install a new one.
    ///
    /// `spawn_reader` runs while the slot is locked, so a reader that exits
    /// immediately cannot detach before it is installed.
    pub async fn replace<F>(&self, conn: Arc<Connection>, spawn_reader: F)
    where
        F: FnOnce() -> AbortHandle,
    {
        let mut slot = self.current.lock().await;
        if let Some(old) = slot.take() {
            tracing::info!(
                channel = self.name,
                old = %old.conn.peer(),
                new = %conn.peer(),
                "replacing device connection"
            );
            old.reader.abort();
            old.conn.close().await;
        }
        let reader = spawn_reader();
        *slot = Some(Live { conn, reader });
    }

    /// Forget `id` if it is still the live connection.
    pub async fn detach(&self, id: u64) {
        let mut slot = self.current.lock().await;
        if slot.as_ref().is_some_and(|live| live.conn.id() == id) {
            *slot = None;
        }
    }

    /// Close whatever is connected.
    pub async fn close(&self) {
        let mut slot = self.current.lock().await;
        if let Some(live) = slot.take() {
            live.reader.abort();
            live.conn.close().await;
        }
    }

    pub async fn current(&self) -> Option<Arc<Connection>> {
        self.current.lock().await.as_ref().map(|l| Arc::clone(&l.conn))
    }

    async fn live(&self) -> Result<Arc<Connection>> {
        self.current().await.ok_or(BridgeError::NotConnected)
    }

    pub async fn is_connected(&self) -> bool {
        self.current().await.is_some()
    }

    /// Adopt addressing on the live connection; no-op when nothing is connected.
    pub async fn set_addressing(&self, user_id: u32, device_id: u32) {
        if let Some(conn) = self.current().await {
            conn.set_addressing(user_id, device_id).await;
        }
    }

    /// Fire-and-forget request.
    pub async fn send(&self, op: Opcode, msg: Option<&Message>) -> Result<Packet> {
        self.live().await?.send(op, msg).await
    }

    /// Send `command`'s request and wait for its reply.
    ///
    /// There is no timeout here: a reply that never comes keeps the caller
    /// waiting until the connection goes away.
    pub async fn send_command(&self, command: Command, msg: Option<&Message>) -> Result<Packet> {
        let (request, reply) = command.pair();
        let conn = self.live().await?;
        let rx = conn.expect(reply);
        if let Err(e) = conn.send(request, msg).await {
            drop(rx);
            conn.forget_abandoned(reply);
            return Err(e);
        }
        let packet = rx.await.map_err(|_| BridgeError::ConnectionClosed)?;
        tracing::debug!(channel = self.name, command = command.as_str(), "command acknowledged");
        Ok(packet)
    }
}
