//! Unified error type for Parlor.

use parlor_protocol::ProtocolError;
use parlor_room::RoomError;
use parlor_session::SessionError;
use parlor_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The engine itself never returns one of these; they surface from
/// server setup (binding, loading the account log) and from hosts that
/// want a single error type. `#[from]` lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum ParlorError {
    /// Binding or accepting failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Account storage or login failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A queue or room operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),
}
