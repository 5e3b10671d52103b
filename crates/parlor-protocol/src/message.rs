//! Typed protocol messages, one variant per signifier.
//!
//! On the wire every message is a comma-separated line whose first field
//! is an integer signifier. Here that line is parsed exactly once into a
//! tagged enum, so nothing above the codec ever splits strings or parses
//! numbers.

use crate::{ConnectionId, MovePayload, ProtocolError, ReplayMode};

/// Signifiers for messages sent by clients.
pub mod client_signifier {
    pub const CREATE_ACCOUNT: u32 = 1;
    pub const LOGIN_ACCOUNT: u32 = 2;
    pub const JOIN_QUEUE: u32 = 3;
    pub const GAME_BUTTON_PRESSED: u32 = 4;
    pub const CHAT_MESSAGE_SENT: u32 = 5;
    pub const JOIN_AS_OBSERVER: u32 = 6;
    pub const LEAVE_ROOM: u32 = 7;
    pub const GET_REPLAY: u32 = 8;
}

/// Signifiers for messages sent by the server.
pub mod server_signifier {
    pub const LOGIN_COMPLETE: u32 = 1;
    pub const LOGIN_FAILED: u32 = 2;
    pub const ACCOUNT_CREATION_COMPLETE: u32 = 3;
    pub const ACCOUNT_CREATION_FAILED: u32 = 4;
    pub const OPPONENT_PLAY: u32 = 5;
    pub const GAME_START: u32 = 6;
    pub const SEND_CHAT_MESSAGE: u32 = 7;
    pub const BACK_TO_MAIN_MENU: u32 = 8;
    pub const SEND_REPLAY: u32 = 9;
}

/// A message that can be flattened into signifier + string fields and
/// rebuilt from them.
///
/// Both directions implement this so the same [`Codec`](crate::Codec)
/// serves the server and test clients.
pub trait WireMessage: Sized {
    /// The integer tag written as field 0.
    fn signifier(&self) -> u32;

    /// The fields after the signifier, in wire order.
    fn fields(&self) -> Vec<String>;

    /// Rebuilds a message from its signifier and remaining fields.
    fn from_fields(signifier: u32, fields: &[&str]) -> Result<Self, ProtocolError>;
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    CreateAccount { name: String, password: String },
    LoginAccount { name: String, password: String },
    JoinQueue,
    GameButtonPressed(MovePayload),
    ChatMessageSent { text: String },
    JoinAsObserver,
    LeaveRoom,
    GetReplay,
}

impl WireMessage for ClientMessage {
    fn signifier(&self) -> u32 {
        use client_signifier::*;
        match self {
            Self::CreateAccount { .. } => CREATE_ACCOUNT,
            Self::LoginAccount { .. } => LOGIN_ACCOUNT,
            Self::JoinQueue => JOIN_QUEUE,
            Self::GameButtonPressed(_) => GAME_BUTTON_PRESSED,
            Self::ChatMessageSent { .. } => CHAT_MESSAGE_SENT,
            Self::JoinAsObserver => JOIN_AS_OBSERVER,
            Self::LeaveRoom => LEAVE_ROOM,
            Self::GetReplay => GET_REPLAY,
        }
    }

    fn fields(&self) -> Vec<String> {
        match self {
            Self::CreateAccount { name, password } | Self::LoginAccount { name, password } => {
                vec![name.clone(), password.clone()]
            }
            Self::GameButtonPressed(mv) => vec![mv.slot.clone(), mv.mark.clone()],
            Self::ChatMessageSent { text } => vec![text.clone()],
            Self::JoinQueue | Self::JoinAsObserver | Self::LeaveRoom | Self::GetReplay => {
                Vec::new()
            }
        }
    }

    fn from_fields(signifier: u32, fields: &[&str]) -> Result<Self, ProtocolError> {
        use client_signifier::*;
        let msg = match signifier {
            CREATE_ACCOUNT => {
                let [name, password] = arity::<2>(signifier, fields)?;
                Self::CreateAccount {
                    name: name.to_owned(),
                    password: password.to_owned(),
                }
            }
            LOGIN_ACCOUNT => {
                let [name, password] = arity::<2>(signifier, fields)?;
                Self::LoginAccount {
                    name: name.to_owned(),
                    password: password.to_owned(),
                }
            }
            JOIN_QUEUE => {
                let [] = arity::<0>(signifier, fields)?;
                Self::JoinQueue
            }
            GAME_BUTTON_PRESSED => {
                let [slot, mark] = arity::<2>(signifier, fields)?;
                Self::GameButtonPressed(MovePayload::new(slot, mark))
            }
            CHAT_MESSAGE_SENT => {
                let [text] = arity::<1>(signifier, fields)?;
                Self::ChatMessageSent {
                    text: text.to_owned(),
                }
            }
            JOIN_AS_OBSERVER => {
                let [] = arity::<0>(signifier, fields)?;
                Self::JoinAsObserver
            }
            LEAVE_ROOM => {
                let [] = arity::<0>(signifier, fields)?;
                Self::LeaveRoom
            }
            GET_REPLAY => {
                let [] = arity::<0>(signifier, fields)?;
                Self::GetReplay
            }
            other => return Err(ProtocolError::UnknownSignifier(other)),
        };
        Ok(msg)
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Everything the server can tell a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    LoginComplete,
    LoginFailed,
    AccountCreationComplete,
    AccountCreationFailed,
    /// A move made in the room, addressed to every member including the
    /// player who made it.
    OpponentPlay(MovePayload),
    /// A room opened (or an observer attached to one).
    ///
    /// `requester_id` is the connection this copy is addressed to. For a
    /// player it equals `self_id`; for an observer it matches neither
    /// player.
    GameStart {
        self_id: ConnectionId,
        opponent_id: ConnectionId,
        starting_slot: ConnectionId,
        requester_id: ConnectionId,
    },
    SendChatMessage { name: String, text: String },
    BackToMainMenu,
    SendReplay { entry: MovePayload, mode: ReplayMode },
}

impl WireMessage for ServerMessage {
    fn signifier(&self) -> u32 {
        use server_signifier::*;
        match self {
            Self::LoginComplete => LOGIN_COMPLETE,
            Self::LoginFailed => LOGIN_FAILED,
            Self::AccountCreationComplete => ACCOUNT_CREATION_COMPLETE,
            Self::AccountCreationFailed => ACCOUNT_CREATION_FAILED,
            Self::OpponentPlay(_) => OPPONENT_PLAY,
            Self::GameStart { .. } => GAME_START,
            Self::SendChatMessage { .. } => SEND_CHAT_MESSAGE,
            Self::BackToMainMenu => BACK_TO_MAIN_MENU,
            Self::SendReplay { .. } => SEND_REPLAY,
        }
    }

    fn fields(&self) -> Vec<String> {
        match self {
            Self::LoginComplete
            | Self::LoginFailed
            | Self::AccountCreationComplete
            | Self::AccountCreationFailed
            | Self::BackToMainMenu => Vec::new(),
            Self::OpponentPlay(mv) => vec![mv.slot.clone(), mv.mark.clone()],
            Self::GameStart {
                self_id,
                opponent_id,
                starting_slot,
                requester_id,
            } => [self_id, opponent_id, starting_slot, requester_id]
                .iter()
                .map(|id| id.into_inner().to_string())
                .collect(),
            Self::SendChatMessage { name, text } => vec![name.clone(), text.clone()],
            Self::SendReplay { entry, mode } => vec![
                entry.slot.clone(),
                entry.mark.clone(),
                mode.flag().to_string(),
            ],
        }
    }

    fn from_fields(signifier: u32, fields: &[&str]) -> Result<Self, ProtocolError> {
        use server_signifier::*;
        let msg = match signifier {
            LOGIN_COMPLETE => {
                let [] = arity::<0>(signifier, fields)?;
                Self::LoginComplete
            }
            LOGIN_FAILED => {
                let [] = arity::<0>(signifier, fields)?;
                Self::LoginFailed
            }
            ACCOUNT_CREATION_COMPLETE => {
                let [] = arity::<0>(signifier, fields)?;
                Self::AccountCreationComplete
            }
            ACCOUNT_CREATION_FAILED => {
                let [] = arity::<0>(signifier, fields)?;
                Self::AccountCreationFailed
            }
            OPPONENT_PLAY => {
                let [slot, mark] = arity::<2>(signifier, fields)?;
                Self::OpponentPlay(MovePayload::new(slot, mark))
            }
            GAME_START => {
                let [a, b, start, req] = arity::<4>(signifier, fields)?;
                Self::GameStart {
                    self_id: parse_id(a)?,
                    opponent_id: parse_id(b)?,
                    starting_slot: parse_id(start)?,
                    requester_id: parse_id(req)?,
                }
            }
            SEND_CHAT_MESSAGE => {
                let [name, text] = arity::<2>(signifier, fields)?;
                Self::SendChatMessage {
                    name: name.to_owned(),
                    text: text.to_owned(),
                }
            }
            BACK_TO_MAIN_MENU => {
                let [] = arity::<0>(signifier, fields)?;
                Self::BackToMainMenu
            }
            SEND_REPLAY => {
                let [slot, mark, flag] = arity::<3>(signifier, fields)?;
                let mode = flag
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .and_then(ReplayMode::from_flag)
                    .ok_or_else(|| ProtocolError::Malformed(format!("bad replay mode {flag:?}")))?;
                Self::SendReplay {
                    entry: MovePayload::new(slot, mark),
                    mode,
                }
            }
            other => return Err(ProtocolError::UnknownSignifier(other)),
        };
        Ok(msg)
    }
}

/// Checks the field count and hands the fields back as a fixed-size array
/// so callers can destructure them.
fn arity<'a, const N: usize>(
    signifier: u32,
    fields: &[&'a str],
) -> Result<[&'a str; N], ProtocolError> {
    <[&str; N]>::try_from(fields).map_err(|_| ProtocolError::FieldCount {
        signifier,
        expected: N,
        got: fields.len(),
    })
}

fn parse_id(field: &str) -> Result<ConnectionId, ProtocolError> {
    field
        .trim()
        .parse::<u64>()
        .map(ConnectionId::new)
        .map_err(|_| ProtocolError::Malformed(format!("bad connection id {field:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_signifiers_follow_wire_numbering() {
        let cases = [
            (
                ClientMessage::CreateAccount {
                    name: "a".into(),
                    password: "b".into(),
                },
                1,
            ),
            (
                ClientMessage::LoginAccount {
                    name: "a".into(),
                    password: "b".into(),
                },
                2,
            ),
            (ClientMessage::JoinQueue, 3),
            (ClientMessage::GameButtonPressed(MovePayload::new("4", "X")), 4),
            (ClientMessage::ChatMessageSent { text: "hi".into() }, 5),
            (ClientMessage::JoinAsObserver, 6),
            (ClientMessage::LeaveRoom, 7),
            (ClientMessage::GetReplay, 8),
        ];
        for (msg, expected) in cases {
            assert_eq!(msg.signifier(), expected, "{msg:?}");
        }
    }

    #[test]
    fn test_server_signifiers_follow_wire_numbering() {
        assert_eq!(ServerMessage::LoginComplete.signifier(), 1);
        assert_eq!(ServerMessage::LoginFailed.signifier(), 2);
        assert_eq!(ServerMessage::AccountCreationComplete.signifier(), 3);
        assert_eq!(ServerMessage::AccountCreationFailed.signifier(), 4);
        assert_eq!(
            ServerMessage::OpponentPlay(MovePayload::new("0", "O")).signifier(),
            5
        );
        assert_eq!(ServerMessage::BackToMainMenu.signifier(), 8);
    }

    #[test]
    fn test_from_fields_create_account() {
        let msg = ClientMessage::from_fields(1, &["alice", "pw1"]).unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateAccount {
                name: "alice".into(),
                password: "pw1".into()
            }
        );
    }

    #[test]
    fn test_from_fields_wrong_arity_is_field_count_error() {
        let err = ClientMessage::from_fields(1, &["alice"]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::FieldCount {
                signifier: 1,
                expected: 2,
                got: 1
            }
        ));

        let err = ClientMessage::from_fields(3, &["extra"]).unwrap_err();
        assert!(matches!(err, ProtocolError::FieldCount { expected: 0, .. }));
    }

    #[test]
    fn test_from_fields_unknown_signifier() {
        let err = ClientMessage::from_fields(42, &[]).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownSignifier(42)));
    }

    #[test]
    fn test_game_start_fields_are_decimal_ids_in_order() {
        let msg = ServerMessage::GameStart {
            self_id: ConnectionId::new(1),
            opponent_id: ConnectionId::new(2),
            starting_slot: ConnectionId::new(2),
            requester_id: ConnectionId::new(1),
        };
        assert_eq!(msg.fields(), vec!["1", "2", "2", "1"]);
    }

    #[test]
    fn test_game_start_rejects_non_numeric_id() {
        let err = ServerMessage::from_fields(6, &["1", "two", "1", "1"]).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_send_replay_carries_mode_flag() {
        let msg = ServerMessage::SendReplay {
            entry: MovePayload::new("4", "X"),
            mode: ReplayMode::CatchUp,
        };
        assert_eq!(msg.fields(), vec!["4", "X", "1"]);

        let err = ServerMessage::from_fields(9, &["4", "X", "7"]).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }
}
