//! Per-connection tasks: one reader, one writer.
//!
//! Neither task touches engine state. The reader forwards everything it
//! sees to the engine task as [`HostEvent`]s; the writer drains the
//! connection's outbox onto the socket. This keeps every engine mutation
//! on a single task no matter how many sockets are open.

use std::sync::Arc;

use parlor_protocol::{Channel, ConnectionId};
use parlor_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

/// Encoded frames waiting to be written to one connection.
pub(crate) type Outbox = mpsc::UnboundedSender<(Channel, Vec<u8>)>;

/// What a connection task reports to the engine task.
#[derive(Debug)]
pub(crate) enum HostEvent {
    /// A peer connected. `outbox` is how the engine task reaches it.
    Connected { id: ConnectionId, outbox: Outbox },
    /// One raw datagram, not yet decoded.
    Data(ConnectionId, Vec<u8>),
    Disconnected(ConnectionId),
}

/// Runs a connection from accept to close.
///
/// Always reports exactly one `Connected` and, unless the engine task is
/// gone, exactly one `Disconnected`.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    events: mpsc::UnboundedSender<HostEvent>,
) {
    let conn = Arc::new(conn);
    let id = conn.id();
    let (outbox, outgoing) = mpsc::unbounded_channel();

    if events.send(HostEvent::Connected { id, outbox }).is_err() {
        tracing::warn!(conn = %id, "engine task gone, dropping connection");
        return;
    }
    tokio::spawn(write_loop(Arc::clone(&conn), outgoing));

    loop {
        match conn.recv().await {
            Ok(Some(data)) => {
                if events.send(HostEvent::Data(id, data)).is_err() {
                    return;
                }
            }
            Ok(None) => {
                tracing::debug!(conn = %id, "peer closed connection");
                break;
            }
            Err(e) => {
                tracing::debug!(conn = %id, error = %e, "recv error");
                break;
            }
        }
    }

    let _ = events.send(HostEvent::Disconnected(id));
}

/// Writes queued frames until the engine task drops the outbox, then
/// closes the socket.
async fn write_loop(
    conn: Arc<WebSocketConnection>,
    mut outgoing: mpsc::UnboundedReceiver<(Channel, Vec<u8>)>,
) {
    while let Some((channel, frame)) = outgoing.recv().await {
        let sent = match channel {
            Channel::Reliable => conn.send(&frame).await,
            Channel::Unreliable => conn.send_unreliable(&frame).await,
        };
        if let Err(e) = sent {
            tracing::debug!(conn = %conn.id(), error = %e, "send failed, writer stopping");
            break;
        }
    }
    let _ = conn.close().await;
}
