//! Error types for the room layer.

use parlor_protocol::{ConnectionId, RoomId};

/// Errors that can occur during queue and room operations.
///
/// None of these are fatal: the engine turns each one into a log line
/// and carries on serving everyone else.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The connection asked for something that needs a room, but it is
    /// neither a player nor an observer anywhere.
    #[error("{0} is not in any room")]
    NoRoomForConnection(ConnectionId),

    /// The connection is already a member of a room.
    #[error("{0} is already in room {1}")]
    AlreadyInRoom(ConnectionId, RoomId),

    /// Only slot occupants may make moves.
    #[error("{0} is not a player in room {1}")]
    NotAPlayer(ConnectionId, RoomId),

    /// There is no room to observe.
    #[error("no active room")]
    NoActiveRoom,

    /// The replay log of a room could not be read or written.
    #[error("replay storage for room {0} failed: {1}")]
    Storage(RoomId, #[source] std::io::Error),
}
