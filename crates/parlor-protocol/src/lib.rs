//! Wire protocol for Parlor.
//!
//! This crate defines the "language" clients and the server speak:
//!
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): one variant per
//!   signifier, with typed fields.
//! - **Codec** ([`Codec`] trait, [`CsvCodec`]): comma-separated text
//!   lines in UTF-16LE, the format the game clients already use.
//! - **Errors** ([`ProtocolError`]): why a datagram was rejected.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Engine (rooms, accounts)
//! ```
//!
//! The protocol layer doesn't know about accounts or rooms; it only turns
//! bytes into messages and back.

mod codec;
mod error;
mod message;
mod types;

pub use codec::{Codec, CsvCodec};
pub use error::ProtocolError;
pub use message::{ClientMessage, ServerMessage, WireMessage, client_signifier, server_signifier};
pub use types::{Channel, ConnectionId, MovePayload, ReplayMode, RoomId};
