use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use congabridge_core::error::Result;
use congabridge_core::protocol::{DecodedPayload, Message, Opcode, Packet, PayloadCodec};

use crate::transport::Connection;

/// The inbound packet plus the connection it arrived on.
#[derive(Clone)]
pub struct PacketCtx {
    pub conn: Arc<Connection>,
    pub packet: Packet,
}

impl PacketCtx {
    /// Answer on the originating connection, echoing the request header
    /// with `flow + 1`.
    pub async fn reply(&self, op: Opcode, msg: Option<&Message>) -> Result<()> {
        let payload = PayloadCodec::encode(op, msg)?;
        self.conn.write_packet(&self.packet.reply(op, payload)).await
    }
}

/// Handles one or more inbound opcodes.
#[async_trait]
pub trait OpcodeHandler: Send + Sync {
    fn opcodes(&self) -> &'static [Opcode];
    async fn handle(&self, ctx: PacketCtx, payload: Option<DecodedPayload>) -> Result<()>;
}

/// Opcode → handler registry.
#[derive(Default)]
pub struct Dispatcher {
    handlers: DashMap<Opcode, Arc<dyn OpcodeHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: Arc<dyn OpcodeHandler>) {
        for op in handler.opcodes() {
            if self.handlers.insert(*op, Arc::clone(&handler)).is_some() {
                tracing::warn!(%op, "handler replaced");
            }
        }
    }

    pub fn registered_opcodes(&self) -> Vec<Opcode> {
        self.handlers.iter().map(|e| *e.key()).collect()
    }

    /// Route one inbound packet.
    ///
    /// Pending commands waiting on this opcode are resolved first, before
    /// the payload is decoded, so an undecodable reply still completes the
    /// command that asked for it.
    pub async fn dispatch(&self, conn: &Arc<Connection>, packet: Packet) -> Result<()> {
        tracing::debug!(%packet, "recv");

        let Some(op) = packet.op() else {
            tracing::debug!(opcode = format_args!("{:#06x}", packet.opcode), "unknown opcode ignored");
            return Ok(());
        };

        conn.deliver(op, &packet);

        let handler = match self.handlers.get(&op) {
            Some(h) => Arc::clone(h.value()),
            None => {
                tracing::debug!(%op, "no handler");
                return Ok(());
            }
        };

        let payload = PayloadCodec::decode(op, &packet.payload)?;
        let ctx = PacketCtx {
            conn: Arc::clone(conn),
            packet,
        };
        handler.handle(ctx, payload).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use tokio::io::duplex;

    use congabridge_core::protocol::PacketBuilder;

    use super::*;

    struct Counting(AtomicUsize);

    #[async_trait]
    impl OpcodeHandler for Counting {
        fn opcodes(&self) -> &'static [Opcode] {
            &[Opcode::QPing]
        }

        async fn handle(&self, _ctx: PacketCtx, _payload: Option<DecodedPayload>) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn conn() -> Arc<Connection> {
        let (client, _device) = duplex(1024);
        Arc::new(Connection::new(
            1,
            4010,
            "127.0.0.1:1".parse().unwrap(),
            Box::new(client),
        ))
    }

    #[tokio::test]
    async fn routes_by_opcode() {
        let d = Dispatcher::new();
        let h = Arc::new(Counting(AtomicUsize::new(0)));
        d.register(h.clone());
        assert_eq!(d.registered_opcodes(), vec![Opcode::QPing]);

        let c = conn();
        let mut b = PacketBuilder::new();
        d.dispatch(&c, b.build(Opcode::QPing, Bytes::new())).await.unwrap();
        d.dispatch(&c, b.build(Opcode::QDeviceInfo, Bytes::new())).await.unwrap();
        assert_eq!(h.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_opcode_is_ignored() {
        let d = Dispatcher::new();
        let mut p = PacketBuilder::new().build(Opcode::QPing, Bytes::new());
        p.opcode = 0xBEEF;
        assert!(d.dispatch(&conn(), p).await.is_ok());
    }

    #[tokio::test]
    async fn waiter_sees_reply_even_when_undecodable() {
        let d = Dispatcher::new();
        let c = conn();
        let rx = c.expect(Opcode::RMapInfo);
        // not a zlib stream; there is no handler either, so dispatch succeeds
        let p = PacketBuilder::new().build(Opcode::RMapInfo, Bytes::from_static(b"junk"));
        d.dispatch(&c, p).await.unwrap();
        assert_eq!(rx.await.unwrap().payload, Bytes::from_static(b"junk"));
    }
}
