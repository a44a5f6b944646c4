use serde::{Deserialize, Serialize};

use crate::contest::ContestSummary;
use crate::session::{SessionSnapshot, Slot};

/// Network message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Client -> Server
    JoinSession = 0x01,
    SelectContest = 0x02,
    StartGame = 0x03,
    SubmitGuess = 0x04,
    ResetGame = 0x05,
    LeaveSession = 0x06,

    // Server -> Client
    JoinResponse = 0x10,
    SessionState = 0x11,
    ContestList = 0x12,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::JoinSession),
            0x02 => Some(Self::SelectContest),
            0x03 => Some(Self::StartGame),
            0x04 => Some(Self::SubmitGuess),
            0x05 => Some(Self::ResetGame),
            0x06 => Some(Self::LeaveSession),
            0x10 => Some(Self::JoinResponse),
            0x11 => Some(Self::SessionState),
            0x12 => Some(Self::ContestList),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    JoinSession(JoinSessionMsg),
    SelectContest(SelectContestMsg),
    StartGame(StartGameMsg),
    SubmitGuess(SubmitGuessMsg),
    ResetGame(ResetGameMsg),
    LeaveSession(LeaveSessionMsg),
}

/// First frame on every connection. An empty `code` creates a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSessionMsg {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub player_name: String,
    pub protocol_version: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectContestMsg {
    pub contest_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartGameMsg {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitGuessMsg {
    pub guess: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetGameMsg {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveSessionMsg {}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    JoinResponse(JoinResponseMsg),
    SessionState(Box<SessionSnapshot>),
    ContestList(ContestListMsg),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponseMsg {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<Slot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JoinResponseMsg {
    pub fn accepted(code: String, slot: Slot) -> Self {
        Self {
            success: true,
            code: Some(code),
            slot: Some(slot),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            code: None,
            slot: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestListMsg {
    pub contests: Vec<ContestSummary>,
}
