//! The relay engine: turns one inbound event into a batch of sends.
//!
//! The engine is plain synchronous state. The host feeds it one event at
//! a time and transmits whatever [`Outbound`]s come back; nothing in here
//! blocks, spawns, or talks to a socket.

use parlor_protocol::{Channel, ClientMessage, ConnectionId, MovePayload, ReplayMode, ServerMessage};
use parlor_room::{Departure, MatchQueue, MemoryReplayStore, RoomDirectory, RoomError};
use parlor_session::{AccountStore, SessionError, SessionRegistry};

/// Chat attribution for connections that weren't logged in when they
/// joined the room.
pub const GUEST_NAME: &str = "Guest";

/// Something the host observed on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Connected(ConnectionId),
    Message(ConnectionId, ClientMessage),
    Disconnected(ConnectionId),
}

/// One send instruction for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub to: ConnectionId,
    pub channel: Channel,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn reliable(to: ConnectionId, message: ServerMessage) -> Self {
        Self {
            to,
            channel: Channel::Reliable,
            message,
        }
    }
}

/// Coordinates accounts, sessions, the match queue and rooms.
///
/// One engine serves one process. It must only ever be driven from a
/// single task: every call to [`handle`](Self::handle) runs to completion
/// before the next, which is what keeps queue and room membership
/// consistent without locks.
#[derive(Debug)]
pub struct RelayEngine {
    accounts: AccountStore,
    sessions: SessionRegistry,
    queue: MatchQueue,
    rooms: RoomDirectory,
}

impl RelayEngine {
    pub fn new(accounts: AccountStore, rooms: RoomDirectory) -> Self {
        Self {
            accounts,
            sessions: SessionRegistry::new(),
            queue: MatchQueue::new(),
            rooms,
        }
    }

    /// An engine that persists nothing to disk.
    pub fn in_memory() -> Self {
        Self::new(
            AccountStore::in_memory(),
            RoomDirectory::new(MemoryReplayStore::new()),
        )
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn queue(&self) -> &MatchQueue {
        &self.queue
    }

    pub fn rooms(&self) -> &RoomDirectory {
        &self.rooms
    }

    /// Processes one event and returns the messages to send, in order.
    ///
    /// Never fails: bad requests become a client notice or a log line.
    pub fn handle(&mut self, event: InboundEvent) -> Vec<Outbound> {
        let mut out = Vec::new();
        match event {
            InboundEvent::Connected(conn) => {
                tracing::info!(%conn, "connected");
            }
            InboundEvent::Message(conn, message) => {
                tracing::debug!(%conn, ?message, "inbound");
                self.dispatch(conn, message, &mut out);
            }
            InboundEvent::Disconnected(conn) => {
                self.disconnect(conn, &mut out);
            }
        }
        out
    }

    fn dispatch(&mut self, conn: ConnectionId, message: ClientMessage, out: &mut Vec<Outbound>) {
        match message {
            ClientMessage::CreateAccount { name, password } => {
                self.create_account(conn, &name, &password, out)
            }
            ClientMessage::LoginAccount { name, password } => {
                self.login(conn, &name, &password, out)
            }
            ClientMessage::JoinQueue => self.join_queue(conn, out),
            ClientMessage::GameButtonPressed(payload) => self.play(conn, payload, out),
            ClientMessage::ChatMessageSent { text } => self.chat(conn, text, out),
            ClientMessage::JoinAsObserver => self.observe(conn, out),
            ClientMessage::LeaveRoom => {
                if let Err(e) = self.depart(conn, out) {
                    tracing::warn!(%conn, error = %e, "leave ignored");
                }
            }
            ClientMessage::GetReplay => self.replay(conn, out),
        }
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    fn create_account(&mut self, conn: ConnectionId, name: &str, password: &str, out: &mut Vec<Outbound>) {
        let reply = match self.accounts.create(name, password) {
            Ok(_) => ServerMessage::AccountCreationComplete,
            Err(SessionError::Storage(e)) => {
                tracing::error!(%conn, %name, error = %e, "could not persist new account");
                ServerMessage::AccountCreationFailed
            }
            Err(e) => {
                tracing::info!(%conn, %name, error = %e, "account creation refused");
                ServerMessage::AccountCreationFailed
            }
        };
        out.push(Outbound::reliable(conn, reply));
    }

    fn login(&mut self, conn: ConnectionId, name: &str, password: &str, out: &mut Vec<Outbound>) {
        let verified = self.accounts.verify(name, password).map(|_| ());
        let reply = match verified {
            Ok(()) => match self.sessions.bind(conn, name, &mut self.accounts) {
                Ok(_) => ServerMessage::LoginComplete,
                Err(e) => {
                    tracing::warn!(%conn, %name, error = %e, "login bind failed");
                    ServerMessage::LoginFailed
                }
            },
            Err(e) => {
                // Same reply for unknown name and wrong password.
                tracing::debug!(%conn, %name, error = %e, "login refused");
                ServerMessage::LoginFailed
            }
        };
        out.push(Outbound::reliable(conn, reply));
    }

    // -----------------------------------------------------------------------
    // Queue and rooms
    // -----------------------------------------------------------------------

    fn join_queue(&mut self, conn: ConnectionId, out: &mut Vec<Outbound>) {
        if let Some(room) = self.rooms.find_by_participant(conn) {
            tracing::warn!(%conn, room_id = %room.id(), "already in a room, queue request ignored");
            return;
        }
        let Some(pairing) = self.queue.enqueue_or_pair(conn) else {
            return;
        };

        let members = [pairing.first, pairing.second];
        let names = members.map(|c| self.sessions.account_for(c).map(str::to_owned));
        let room = match self.rooms.open(pairing) {
            Ok(room) => room,
            Err(e @ RoomError::Storage(..)) => {
                tracing::error!(%conn, error = %e, "could not open room");
                return;
            }
            Err(e) => {
                tracing::warn!(%conn, error = %e, "could not open room");
                return;
            }
        };
        for (member, name) in members.into_iter().zip(names) {
            if let Some(name) = name {
                room.remember_account(member, name);
            }
        }

        let starting_slot = room.starting_slot();
        for (me, opponent) in [(pairing.first, pairing.second), (pairing.second, pairing.first)] {
            out.push(Outbound::reliable(
                me,
                ServerMessage::GameStart {
                    self_id: me,
                    opponent_id: opponent,
                    starting_slot,
                    requester_id: me,
                },
            ));
        }
    }

    fn observe(&mut self, conn: ConnectionId, out: &mut Vec<Outbound>) {
        let name = self.sessions.account_for(conn).map(str::to_owned);
        let room = match self.rooms.attach_observer(conn) {
            Ok(room) => room,
            Err(e) => {
                tracing::warn!(%conn, error = %e, "observe request ignored");
                return;
            }
        };
        if let Some(name) = name {
            room.remember_account(conn, name);
        }

        let [first, second] = room.players();
        let (room_id, starting_slot, turns) = (room.id(), room.starting_slot(), room.turn_count());
        out.push(Outbound::reliable(
            conn,
            ServerMessage::GameStart {
                self_id: first,
                opponent_id: second,
                starting_slot,
                requester_id: conn,
            },
        ));
        self.queue.remove_if_waiting(conn);

        if turns > 0 {
            match self.rooms.load_replay(room_id) {
                Ok(entries) => send_replay(conn, entries, ReplayMode::CatchUp, out),
                Err(e) => tracing::error!(%conn, error = %e, "could not load catch-up replay"),
            }
        }
    }

    fn play(&mut self, conn: ConnectionId, payload: MovePayload, out: &mut Vec<Outbound>) {
        match self.rooms.record_move(conn, payload.clone()) {
            Ok(room) => {
                for to in room.audience() {
                    out.push(Outbound::reliable(to, ServerMessage::OpponentPlay(payload.clone())));
                }
            }
            Err(e @ RoomError::Storage(..)) => {
                tracing::error!(%conn, error = %e, "move dropped");
            }
            Err(e) => {
                tracing::warn!(%conn, error = %e, "move ignored");
            }
        }
    }

    fn chat(&mut self, conn: ConnectionId, text: String, out: &mut Vec<Outbound>) {
        let Some(room) = self.rooms.find_by_participant(conn) else {
            tracing::warn!(%conn, "chat from connection with no room");
            return;
        };
        let name = room.account_name(conn).unwrap_or(GUEST_NAME);
        for to in room.audience() {
            out.push(Outbound::reliable(
                to,
                ServerMessage::SendChatMessage {
                    name: name.to_owned(),
                    text: text.clone(),
                },
            ));
        }
    }

    fn replay(&mut self, conn: ConnectionId, out: &mut Vec<Outbound>) {
        let Some(room_id) = self.rooms.find_by_participant(conn).map(|room| room.id()) else {
            tracing::warn!(%conn, "replay request from connection with no room");
            return;
        };
        match self.rooms.load_replay(room_id) {
            Ok(entries) => send_replay(conn, entries, ReplayMode::Review, out),
            Err(e) => tracing::error!(%conn, error = %e, "could not load replay"),
        }
    }

    /// Removes `conn` from its room, sending remaining observers back to
    /// the lobby if the room closed.
    fn depart(&mut self, conn: ConnectionId, out: &mut Vec<Outbound>) -> Result<(), RoomError> {
        if let Departure::Closed { observers, .. } = self.rooms.leave(conn)? {
            for observer in observers {
                out.push(Outbound::reliable(observer, ServerMessage::BackToMainMenu));
            }
        }
        Ok(())
    }

    fn disconnect(&mut self, conn: ConnectionId, out: &mut Vec<Outbound>) {
        self.queue.remove_if_waiting(conn);
        match self.depart(conn, out) {
            Ok(()) | Err(RoomError::NoRoomForConnection(_)) => {}
            Err(e) => tracing::warn!(%conn, error = %e, "room cleanup failed"),
        }
        self.sessions.unbind(conn, &mut self.accounts);
        tracing::info!(%conn, "disconnected");
    }
}

fn send_replay(to: ConnectionId, entries: Vec<MovePayload>, mode: ReplayMode, out: &mut Vec<Outbound>) {
    tracing::debug!(%to, entries = entries.len(), ?mode, "sending replay");
    out.extend(
        entries
            .into_iter()
            .map(|entry| Outbound::reliable(to, ServerMessage::SendReplay { entry, mode })),
    );
}
