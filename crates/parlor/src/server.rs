//! `ParlorServer` builder and host loop.
//!
//! This ties the layers together: the WebSocket transport accepts peers,
//! connection tasks turn sockets into [`HostEvent`]s, and a single engine
//! task decodes them, drives the [`RelayEngine`], and routes the replies.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use parlor_protocol::{ClientMessage, Codec, ConnectionId, CsvCodec};
use parlor_room::{FileReplayStore, MemoryReplayStore, RoomDirectory};
use parlor_session::{AccountStore, FileAccountLog};
use parlor_transport::{Transport, WebSocketTransport};
use tokio::sync::mpsc;

use crate::engine::{InboundEvent, Outbound, RelayEngine};
use crate::handler::{HostEvent, Outbox, handle_connection};
use crate::ParlorError;

/// Port the game clients connect to unless configured otherwise.
pub const DEFAULT_PORT: u16 = 5491;

#[derive(Debug, Clone)]
enum AccountBackend {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone)]
enum ReplayBackend {
    Dir(PathBuf),
    Memory,
}

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,no_run
/// use parlor::prelude::*;
///
/// # async fn start() -> Result<(), ParlorError> {
/// let server = ParlorServer::builder()
///     .bind("0.0.0.0:5491")
///     .accounts_file("data/PlayerAccounts.txt")
///     .replay_dir("data/replays")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ParlorServerBuilder {
    bind_addr: String,
    accounts: AccountBackend,
    replays: ReplayBackend,
}

impl ParlorServerBuilder {
    /// Creates a builder with default settings: `127.0.0.1:5491`,
    /// accounts in `PlayerAccounts.txt`, replays under `replays/`.
    pub fn new() -> Self {
        Self {
            bind_addr: format!("127.0.0.1:{DEFAULT_PORT}"),
            accounts: AccountBackend::File(PathBuf::from("PlayerAccounts.txt")),
            replays: ReplayBackend::Dir(PathBuf::from("replays")),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Persists accounts to `path`.
    pub fn accounts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.accounts = AccountBackend::File(path.into());
        self
    }

    /// Keeps accounts in memory only; they are lost on shutdown.
    pub fn in_memory_accounts(mut self) -> Self {
        self.accounts = AccountBackend::Memory;
        self
    }

    /// Persists one replay file per room under `dir`.
    pub fn replay_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.replays = ReplayBackend::Dir(dir.into());
        self
    }

    /// Keeps replays in memory only.
    pub fn ephemeral_replays(mut self) -> Self {
        self.replays = ReplayBackend::Memory;
        self
    }

    /// Loads the account log and binds the listener.
    ///
    /// # Errors
    /// [`ParlorError::Session`] if an existing account log can't be
    /// read; [`ParlorError::Transport`] if the address can't be bound.
    pub async fn build(self) -> Result<ParlorServer, ParlorError> {
        let accounts = match self.accounts {
            AccountBackend::File(path) => AccountStore::open(FileAccountLog::new(path))?,
            AccountBackend::Memory => AccountStore::in_memory(),
        };
        let rooms = match self.replays {
            ReplayBackend::Dir(dir) => RoomDirectory::new(FileReplayStore::new(dir)),
            ReplayBackend::Memory => RoomDirectory::new(MemoryReplayStore::new()),
        };
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        Ok(ParlorServer {
            transport,
            engine: RelayEngine::new(accounts, rooms),
            codec: CsvCodec,
        })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Parlor server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParlorServer {
    transport: WebSocketTransport,
    engine: RelayEngine,
    codec: CsvCodec,
}

impl ParlorServer {
    /// Creates a new builder.
    pub fn builder() -> ParlorServerBuilder {
        ParlorServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the task is dropped.
    ///
    /// The engine moves onto its own task; each accepted connection gets
    /// a reader and a writer task that talk to it over channels.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        match self.transport.local_addr() {
            Ok(addr) => tracing::info!(%addr, "parlor server listening"),
            Err(e) => tracing::warn!(error = %e, "parlor server listening on unknown address"),
        }

        let (events, inbox) = mpsc::unbounded_channel();
        tokio::spawn(drive_engine(self.engine, self.codec, inbox));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    tokio::spawn(handle_connection(conn, events.clone()));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// The single writer: the only task that ever touches the engine.
async fn drive_engine<C: Codec>(
    mut engine: RelayEngine,
    codec: C,
    mut inbox: mpsc::UnboundedReceiver<HostEvent>,
) {
    let mut outboxes: HashMap<ConnectionId, Outbox> = HashMap::new();

    while let Some(event) = inbox.recv().await {
        let (event, gone) = match event {
            HostEvent::Connected { id, outbox } => {
                outboxes.insert(id, outbox);
                (InboundEvent::Connected(id), None)
            }
            HostEvent::Data(id, data) => match codec.decode::<ClientMessage>(&data) {
                Ok(message) => (InboundEvent::Message(id, message), None),
                Err(e) => {
                    tracing::warn!(conn = %id, error = %e, "dropping malformed frame");
                    continue;
                }
            },
            HostEvent::Disconnected(id) => (InboundEvent::Disconnected(id), Some(id)),
        };

        for outbound in engine.handle(event) {
            deliver(&codec, &outboxes, outbound);
        }
        // Dropping the outbox lets the writer task finish and close.
        if let Some(id) = gone {
            outboxes.remove(&id);
        }
    }

    tracing::info!("engine task stopped");
}

fn deliver<C: Codec>(codec: &C, outboxes: &HashMap<ConnectionId, Outbox>, outbound: Outbound) {
    let frame = match codec.encode(&outbound.message) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(conn = %outbound.to, error = %e, "could not encode outbound message");
            return;
        }
    };
    let delivered = outboxes
        .get(&outbound.to)
        .is_some_and(|outbox| outbox.send((outbound.channel, frame)).is_ok());
    if !delivered {
        tracing::debug!(conn = %outbound.to, "recipient gone, message dropped");
    }
}
