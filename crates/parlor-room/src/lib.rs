//! Matchmaking and room lifecycle for Parlor.
//!
//! Everything here is plain synchronous state; the engine above drives it
//! one event at a time, so nothing needs a lock.
//!
//! # Key types
//!
//! - [`MatchQueue`]: holds the one connection waiting for an opponent
//! - [`RoomDirectory`]: opens rooms for pairings, finds them by member
//! - [`GameRoom`]: two player slots, observers, and the replay log
//! - [`ReplayStore`]: where replay logs are persisted, one per room

mod directory;
mod error;
mod queue;
mod replay;
mod room;

pub use directory::{Departure, RoomDirectory};
pub use error::RoomError;
pub use queue::{MatchQueue, Pairing};
pub use replay::{FileReplayStore, MemoryReplayStore, ReplayEntry, ReplayStore};
pub use room::{GameRoom, Role};
