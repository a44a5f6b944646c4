use serde::{Deserialize, Serialize};

use super::messages::{
    ClientMessage, ContestListMsg, JoinResponseMsg, JoinSessionMsg, LeaveSessionMsg, MessageType,
    ResetGameMsg, SelectContestMsg, ServerMessage, StartGameMsg, SubmitGuessMsg,
};
use crate::session::SessionSnapshot;

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Maximum message payload size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownMessageType(u8),
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::UnknownMessageType(b) => write!(f, "unknown message type: 0x{b:02x}"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a serializable payload with a 1-byte type prefix.
///
/// Structs are written as MessagePack maps keyed by field name, so optional
/// fields may be omitted by the sender.
pub fn encode_message<T: Serialize>(
    msg_type: MessageType,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_bytes = rmp_serde::to_vec_named(payload)
        .map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload_bytes.len();
    if total > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(msg_type as u8);
    buf.extend_from_slice(&payload_bytes);
    Ok(buf)
}

pub fn encode_client_message(msg: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ClientMessage::JoinSession(m) => encode_message(MessageType::JoinSession, m),
        ClientMessage::SelectContest(m) => encode_message(MessageType::SelectContest, m),
        ClientMessage::StartGame(m) => encode_message(MessageType::StartGame, m),
        ClientMessage::SubmitGuess(m) => encode_message(MessageType::SubmitGuess, m),
        ClientMessage::ResetGame(m) => encode_message(MessageType::ResetGame, m),
        ClientMessage::LeaveSession(m) => encode_message(MessageType::LeaveSession, m),
    }
}

pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ServerMessage::JoinResponse(m) => encode_message(MessageType::JoinResponse, m),
        ServerMessage::SessionState(m) => encode_message(MessageType::SessionState, m),
        ServerMessage::ContestList(m) => encode_message(MessageType::ContestList, m),
    }
}

/// Extract the message type byte from raw wire data.
pub fn decode_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    let &first = data.first().ok_or(ProtocolError::EmptyMessage)?;
    MessageType::from_byte(first).ok_or(ProtocolError::UnknownMessageType(first))
}

/// Decode a MessagePack payload (bytes after the type prefix).
pub fn decode_payload<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    let payload = data.get(1..).ok_or(ProtocolError::EmptyMessage)?;
    rmp_serde::from_slice(payload).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

pub fn decode_client_message(data: &[u8]) -> Result<ClientMessage, ProtocolError> {
    match decode_message_type(data)? {
        MessageType::JoinSession => Ok(ClientMessage::JoinSession(decode_payload::<
            JoinSessionMsg,
        >(data)?)),
        MessageType::SelectContest => Ok(ClientMessage::SelectContest(decode_payload::<
            SelectContestMsg,
        >(data)?)),
        MessageType::StartGame => Ok(ClientMessage::StartGame(decode_payload::<StartGameMsg>(
            data,
        )?)),
        MessageType::SubmitGuess => Ok(ClientMessage::SubmitGuess(decode_payload::<
            SubmitGuessMsg,
        >(data)?)),
        MessageType::ResetGame => Ok(ClientMessage::ResetGame(decode_payload::<ResetGameMsg>(
            data,
        )?)),
        MessageType::LeaveSession => Ok(ClientMessage::LeaveSession(decode_payload::<
            LeaveSessionMsg,
        >(data)?)),
        other => Err(ProtocolError::UnknownMessageType(other as u8)),
    }
}

pub fn decode_server_message(data: &[u8]) -> Result<ServerMessage, ProtocolError> {
    match decode_message_type(data)? {
        MessageType::JoinResponse => Ok(ServerMessage::JoinResponse(decode_payload::<
            JoinResponseMsg,
        >(data)?)),
        MessageType::SessionState => Ok(ServerMessage::SessionState(Box::new(decode_payload::<
            SessionSnapshot,
        >(data)?))),
        MessageType::ContestList => Ok(ServerMessage::ContestList(decode_payload::<
            ContestListMsg,
        >(data)?)),
        other => Err(ProtocolError::UnknownMessageType(other as u8)),
    }
}
