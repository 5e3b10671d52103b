//! A single game room: two player slots, observers, and a replay log.

use std::collections::BTreeMap;

use parlor_protocol::{ConnectionId, RoomId};

use crate::{ReplayEntry, ReplayStore, RoomError};

/// What a departing connection was to its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Player,
    Observer,
}

/// One active pairing of two players plus any number of observers.
///
/// A player who leaves vacates their slot rather than disappearing, so
/// the room still knows who played. The room is terminal once both slots
/// are vacated.
///
/// Invariant: `turn_count == replay.len()`.
#[derive(Debug)]
pub struct GameRoom {
    id: RoomId,
    /// The two players the room was opened for, in pairing order.
    players: [ConnectionId; 2],
    /// Current slot occupants; `None` once vacated.
    slots: [Option<ConnectionId>; 2],
    starting_slot: ConnectionId,
    turn_count: usize,
    observers: Vec<ConnectionId>,
    /// Account names of members at the time they joined. Never pruned.
    accounts: BTreeMap<ConnectionId, String>,
    replay: Vec<ReplayEntry>,
}

impl GameRoom {
    pub(crate) fn new(id: RoomId, players: [ConnectionId; 2], starting_slot: ConnectionId) -> Self {
        debug_assert!(players.contains(&starting_slot));
        Self {
            id,
            players,
            slots: [Some(players[0]), Some(players[1])],
            starting_slot,
            turn_count: 0,
            observers: Vec::new(),
            accounts: BTreeMap::new(),
            replay: Vec::new(),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    /// The two players the room was opened for, whether or not they have
    /// since left.
    pub fn players(&self) -> [ConnectionId; 2] {
        self.players
    }

    /// The player who moves first. Fixed for the life of the room.
    pub fn starting_slot(&self) -> ConnectionId {
        self.starting_slot
    }

    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    pub fn observers(&self) -> &[ConnectionId] {
        &self.observers
    }

    /// The in-memory replay log, oldest move first.
    pub fn replay(&self) -> &[ReplayEntry] {
        &self.replay
    }

    /// Whether `connection` currently occupies a slot.
    pub fn is_player(&self, connection: ConnectionId) -> bool {
        self.slots.contains(&Some(connection))
    }

    pub fn is_observer(&self, connection: ConnectionId) -> bool {
        self.observers.contains(&connection)
    }

    /// Whether `connection` is a current player or observer.
    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.is_player(connection) || self.is_observer(connection)
    }

    /// Whether slot `index` (0 or 1) has been vacated.
    pub fn is_vacated(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(Option::is_none)
    }

    /// True once both slots are vacated.
    pub fn is_terminal(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Records the account name of a member for chat attribution.
    pub fn remember_account(&mut self, connection: ConnectionId, name: impl Into<String>) {
        self.accounts.insert(connection, name.into());
    }

    /// The account name recorded for `connection`, if it was logged in
    /// when it joined.
    pub fn account_name(&self, connection: ConnectionId) -> Option<&str> {
        self.accounts.get(&connection).map(String::as_str)
    }

    /// Everyone a move or chat line is relayed to: occupied slots first,
    /// then observers, each connection once.
    pub fn audience(&self) -> Vec<ConnectionId> {
        let mut audience: Vec<ConnectionId> = self.slots.iter().flatten().copied().collect();
        for observer in &self.observers {
            if !audience.contains(observer) {
                audience.push(*observer);
            }
        }
        audience
    }

    pub(crate) fn attach_observer(&mut self, connection: ConnectionId) {
        if !self.observers.contains(&connection) {
            self.observers.push(connection);
        }
    }

    /// Appends a move and persists the whole log.
    ///
    /// If persisting fails the append is undone, so memory never runs
    /// ahead of storage.
    pub(crate) fn record_move(
        &mut self,
        entry: ReplayEntry,
        store: &mut dyn ReplayStore,
    ) -> Result<&ReplayEntry, RoomError> {
        self.replay.push(entry);
        if let Err(e) = store.save(self.id, &self.replay) {
            self.replay.pop();
            return Err(RoomError::Storage(self.id, e));
        }
        self.turn_count += 1;
        Ok(&self.replay[self.replay.len() - 1])
    }

    /// Removes `connection` from the room.
    ///
    /// A player's slot is vacated; an observer is dropped. Returns `None`
    /// if `connection` wasn't a member.
    pub(crate) fn leave(&mut self, connection: ConnectionId) -> Option<Role> {
        if let Some(slot) = self.slots.iter_mut().find(|s| **s == Some(connection)) {
            *slot = None;
            return Some(Role::Player);
        }
        let position = self.observers.iter().position(|o| *o == connection)?;
        self.observers.remove(position);
        Some(Role::Observer)
    }
}
