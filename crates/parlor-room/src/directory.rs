//! Room directory: opens, finds, and closes game rooms.

use std::collections::BTreeMap;

use parlor_protocol::{ConnectionId, RoomId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{GameRoom, Pairing, ReplayEntry, ReplayStore, Role, RoomError};

/// The outcome of a connection leaving its room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// The room lives on.
    Left { room: RoomId, role: Role },
    /// The last player left; the room is gone. `observers` were still
    /// watching and need sending back to the lobby.
    Closed {
        room: RoomId,
        role: Role,
        observers: Vec<ConnectionId>,
    },
}

impl Departure {
    pub fn room(&self) -> RoomId {
        match self {
            Self::Left { room, .. } | Self::Closed { room, .. } => *room,
        }
    }
}

/// Every active room, plus the replay store they persist into.
///
/// Rooms are kept ordered by id, so "the oldest room" is simply the
/// first one. A connection is a member of at most one room.
pub struct RoomDirectory {
    rooms: BTreeMap<RoomId, GameRoom>,
    next_room_id: u64,
    store: Box<dyn ReplayStore>,
    rng: StdRng,
}

impl RoomDirectory {
    /// Creates an empty directory that picks starting players with an
    /// OS-seeded generator.
    pub fn new(store: impl ReplayStore + 'static) -> Self {
        Self::with_rng(store, StdRng::from_os_rng())
    }

    /// Creates an empty directory with a caller-supplied generator, for
    /// reproducible starting-player draws.
    ///
    /// Room ids continue after the highest id `store` already holds a
    /// log for, so earlier games keep their replays.
    pub fn with_rng(store: impl ReplayStore + 'static, rng: StdRng) -> Self {
        let next_room_id = match store.last_room() {
            Ok(last) => last.map_or(1, |id| id.0 + 1),
            Err(e) => {
                tracing::warn!(error = %e, "could not scan replay store, numbering rooms from 1");
                1
            }
        };
        Self {
            rooms: BTreeMap::new(),
            next_room_id,
            store: Box::new(store),
            rng,
        }
    }

    /// Opens a room for a fresh pairing.
    ///
    /// The starting player is drawn uniformly from the two.
    ///
    /// The room starts with an empty persisted log, replacing anything
    /// stored under its id.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInRoom`]: either connection is already a
    ///   member of some room
    /// - [`RoomError::Storage`]: the empty log could not be written
    pub fn open(&mut self, pairing: Pairing) -> Result<&mut GameRoom, RoomError> {
        for connection in [pairing.first, pairing.second] {
            if let Some(room) = self.find_by_participant(connection) {
                return Err(RoomError::AlreadyInRoom(connection, room.id()));
            }
        }

        let id = RoomId(self.next_room_id);
        self.next_room_id += 1;
        self.store.save(id, &[]).map_err(|e| RoomError::Storage(id, e))?;
        let starting_slot = if self.rng.random_bool(0.5) {
            pairing.first
        } else {
            pairing.second
        };

        tracing::info!(
            room_id = %id,
            first = %pairing.first,
            second = %pairing.second,
            %starting_slot,
            "room opened"
        );
        let room = GameRoom::new(id, [pairing.first, pairing.second], starting_slot);
        Ok(self.rooms.entry(id).or_insert(room))
    }

    /// The room `connection` plays in or observes.
    pub fn find_by_participant(&self, connection: ConnectionId) -> Option<&GameRoom> {
        self.rooms.values().find(|room| room.contains(connection))
    }

    pub fn find_by_participant_mut(&mut self, connection: ConnectionId) -> Option<&mut GameRoom> {
        self.rooms.values_mut().find(|room| room.contains(connection))
    }

    pub fn get(&self, id: RoomId) -> Option<&GameRoom> {
        self.rooms.get(&id)
    }

    /// Attaches `connection` as an observer of the oldest active room.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInRoom`] if it is already a member somewhere
    /// - [`RoomError::NoActiveRoom`] if there is nothing to observe
    pub fn attach_observer(&mut self, connection: ConnectionId) -> Result<&mut GameRoom, RoomError> {
        if let Some(room) = self.find_by_participant(connection) {
            return Err(RoomError::AlreadyInRoom(connection, room.id()));
        }
        let room = self
            .rooms
            .values_mut()
            .next()
            .ok_or(RoomError::NoActiveRoom)?;
        room.attach_observer(connection);
        tracing::info!(room_id = %room.id(), %connection, "observer attached");
        Ok(room)
    }

    /// Records a move by a slot occupant and persists the room's replay.
    ///
    /// # Errors
    /// - [`RoomError::NoRoomForConnection`] if `connection` is in no room
    /// - [`RoomError::NotAPlayer`] if it only observes
    /// - [`RoomError::Storage`] if the replay could not be persisted; the
    ///   move is then not recorded
    pub fn record_move(
        &mut self,
        connection: ConnectionId,
        entry: ReplayEntry,
    ) -> Result<&GameRoom, RoomError> {
        let room = self
            .rooms
            .values_mut()
            .find(|room| room.contains(connection))
            .ok_or(RoomError::NoRoomForConnection(connection))?;
        if !room.is_player(connection) {
            return Err(RoomError::NotAPlayer(connection, room.id()));
        }
        room.record_move(entry, self.store.as_mut())?;
        tracing::debug!(room_id = %room.id(), %connection, turn = room.turn_count(), "move recorded");
        Ok(room)
    }

    /// Removes `connection` from its room, closing the room if that
    /// vacated the last occupied slot.
    ///
    /// # Errors
    /// [`RoomError::NoRoomForConnection`] if it is in no room.
    pub fn leave(&mut self, connection: ConnectionId) -> Result<Departure, RoomError> {
        let room = self
            .find_by_participant_mut(connection)
            .ok_or(RoomError::NoRoomForConnection(connection))?;
        let id = room.id();
        let role = room
            .leave(connection)
            .ok_or(RoomError::NoRoomForConnection(connection))?;
        tracing::info!(room_id = %id, %connection, ?role, "left room");

        if !room.is_terminal() {
            return Ok(Departure::Left { room: id, role });
        }

        let observers = room.observers().to_vec();
        self.rooms.remove(&id);
        tracing::info!(room_id = %id, observers = observers.len(), "room closed");
        Ok(Departure::Closed {
            room: id,
            role,
            observers,
        })
    }

    /// Reads back the persisted replay of `room`.
    pub fn load_replay(&self, room: RoomId) -> Result<Vec<ReplayEntry>, RoomError> {
        self.store.load(room).map_err(|e| RoomError::Storage(room, e))
    }

    /// Number of active rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameRoom> {
        self.rooms.values()
    }
}

impl std::fmt::Debug for RoomDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomDirectory")
            .field("rooms", &self.rooms)
            .field("next_room_id", &self.next_room_id)
            .finish_non_exhaustive()
    }
}
