//! # Parlor
//!
//! A small relay server for two-player turn-based games.
//!
//! Parlor handles accounts, pairs waiting players into rooms, relays
//! moves and chat to both players and any observers, and keeps a replay
//! of every room. It never interprets a move; game rules live in the
//! clients.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! # async fn start() -> Result<(), ParlorError> {
//! let server = ParlorServer::builder()
//!     .bind("0.0.0.0:5491")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! To drive the coordination logic without a network, feed
//! [`InboundEvent`]s to a [`RelayEngine`] directly.

mod engine;
mod error;
mod handler;
mod server;

pub use engine::{GUEST_NAME, InboundEvent, Outbound, RelayEngine};
pub use error::ParlorError;
pub use server::{DEFAULT_PORT, ParlorServer, ParlorServerBuilder};

/// Re-exports everything a host or test needs.
pub mod prelude {
    pub use crate::{
        DEFAULT_PORT, GUEST_NAME, InboundEvent, Outbound, ParlorError, ParlorServer,
        ParlorServerBuilder, RelayEngine,
    };
    pub use parlor_protocol::{
        Channel, ClientMessage, Codec, ConnectionId, CsvCodec, MovePayload, ProtocolError,
        ReplayMode, RoomId, ServerMessage,
    };
    pub use parlor_room::{
        FileReplayStore, MemoryReplayStore, ReplayEntry, ReplayStore, RoomDirectory, RoomError,
    };
    pub use parlor_session::{
        AccountStore, FileAccountLog, MemoryAccountLog, SessionError, SessionRegistry,
    };
}
