//! Identity and delivery types shared by every layer above the transport.

use std::fmt;

pub use parlor_transport::ConnectionId;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of one game room.
///
/// Allocated by the room directory from its own counter; also used as the
/// persisted identity of the room's replay log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Which transport channel a message travels on.
///
/// The transport offers a reliable and an unreliable channel. Everything
/// the coordination engine emits goes out reliably; the unreliable variant
/// exists so hosts can route their own traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    /// Delivered in order, no loss.
    #[default]
    Reliable,
    /// May be lost or reordered.
    Unreliable,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// One player action as the client reported it.
///
/// The server never interprets these strings; game rules are the
/// client's business. `slot` is the board position, `mark` the symbol
/// placed there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MovePayload {
    pub slot: String,
    pub mark: String,
}

impl MovePayload {
    pub fn new(slot: impl Into<String>, mark: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            mark: mark.into(),
        }
    }
}

/// How a client should treat a replayed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    /// Explicitly requested review by someone already in the room.
    Review,
    /// Silent fast-forward for an observer that just attached.
    CatchUp,
}

impl ReplayMode {
    /// The numeric flag carried on the wire.
    pub fn flag(self) -> u8 {
        match self {
            Self::Review => 0,
            Self::CatchUp => 1,
        }
    }

    /// Parses a wire flag. Anything but `0` or `1` is rejected.
    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(Self::Review),
            1 => Some(Self::CatchUp),
            _ => None,
        }
    }
}
