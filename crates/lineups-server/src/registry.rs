use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use lineups_core::code::{generate_session_code, normalize_session_code};
use lineups_core::contest::ContestCatalog;
use lineups_core::net::messages::ServerMessage;
use lineups_core::net::protocol::encode_server_message;
use lineups_core::session::{ConnectionId, Participant, Session, SessionSnapshot, Slot};

/// Per-participant sender for outbound WebSocket binary messages.
/// Uses `Bytes` so one encoded snapshot is shared across both participants.
pub type ParticipantSender = mpsc::Sender<Bytes>;

/// Upper bound on code draws before session creation gives up.
const MAX_CODE_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    NotFound,
    Full,
}

impl std::fmt::Display for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "Session not found"),
            Self::Full => write!(f, "Session is full"),
        }
    }
}

impl std::error::Error for JoinError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    CodeSpaceExhausted,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CodeSpaceExhausted => {
                write!(
                    f,
                    "no free session code after {MAX_CODE_ATTEMPTS} attempts"
                )
            },
        }
    }
}

impl std::error::Error for RegistryError {}

/// What happened to a session when a connection went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Updated(SessionSnapshot),
    Deleted(String),
}

struct SessionEntry {
    session: Session,
    connections: HashMap<ConnectionId, ParticipantSender>,
}

impl SessionEntry {
    /// Encode the snapshot once and queue it for every participant.
    /// Participants whose buffers are full are skipped.
    fn publish(&self) -> SessionSnapshot {
        let snapshot = self.session.snapshot();
        let code = self.session.code();
        let msg = ServerMessage::SessionState(Box::new(snapshot.clone()));
        match encode_server_message(&msg) {
            Ok(data) => {
                let bytes = Bytes::from(data);
                for (&connection, sender) in &self.connections {
                    if let Err(e) = sender.try_send(bytes.clone()) {
                        tracing::debug!(
                            connection, code, error = %e,
                            "Skipping broadcast to slow client"
                        );
                    }
                }
            },
            Err(e) => tracing::warn!(code, error = %e, "Failed to encode session state"),
        }
        snapshot
    }
}

/// Owns every live session and the outbound channel of each participant.
///
/// Every successful mutation broadcasts the new snapshot to the session's
/// participants before returning, so callers holding the registry lock
/// publish transitions in the order they were applied.
pub struct SessionRegistry {
    sessions: HashMap<String, SessionEntry>,
    catalog: Arc<ContestCatalog>,
}

impl SessionRegistry {
    pub fn new(catalog: Arc<ContestCatalog>) -> Self {
        Self {
            sessions: HashMap::new(),
            catalog,
        }
    }

    pub fn catalog(&self) -> &ContestCatalog {
        &self.catalog
    }

    /// Open a session with `host` in slot A and the catalog's first contest.
    pub fn create_session(
        &mut self,
        host: Participant,
        sender: ParticipantSender,
    ) -> Result<SessionSnapshot, RegistryError> {
        let code = self.allocate_code(generate_session_code)?;
        let connection = host.connection;
        let contest_id = self.catalog.default_contest().id.clone();
        let session = Session::new(code.clone(), contest_id, host);

        let mut connections = HashMap::new();
        connections.insert(connection, sender);
        let entry = SessionEntry {
            session,
            connections,
        };
        let snapshot = entry.publish();
        self.sessions.insert(code.clone(), entry);

        tracing::info!(code = %code, connection, "Session created");
        Ok(snapshot)
    }

    fn allocate_code(
        &self,
        mut generate: impl FnMut() -> String,
    ) -> Result<String, RegistryError> {
        (0..MAX_CODE_ATTEMPTS)
            .map(|_| generate())
            .find(|code| !self.sessions.contains_key(code))
            .ok_or(RegistryError::CodeSpaceExhausted)
    }

    /// Seat `guest` in slot B of an existing session.
    pub fn join_session(
        &mut self,
        code: &str,
        guest: Participant,
        sender: ParticipantSender,
    ) -> Result<SessionSnapshot, JoinError> {
        let code = normalize_session_code(code);
        let entry = self.sessions.get_mut(&code).ok_or(JoinError::NotFound)?;

        let connection = guest.connection;
        if entry.session.participant(Slot::A).is_none() || !entry.session.seat_guest(guest) {
            return Err(JoinError::Full);
        }
        entry.connections.insert(connection, sender);

        tracing::info!(code = %code, connection, "Participant joined");
        Ok(entry.publish())
    }

    pub fn select_contest(&mut self, code: &str, contest_id: &str) -> Option<SessionSnapshot> {
        let entry = self.sessions.get_mut(code)?;
        if !entry.session.select_contest(&self.catalog, contest_id) {
            tracing::debug!(code, contest_id, "Contest selection ignored");
            return None;
        }
        tracing::info!(code, contest_id, "Contest selected");
        Some(entry.publish())
    }

    pub fn start(&mut self, code: &str) -> Option<SessionSnapshot> {
        let entry = self.sessions.get_mut(code)?;
        if !entry.session.start() {
            tracing::debug!(code, "Start ignored");
            return None;
        }
        tracing::info!(code, contest = %entry.session.contest_id(), "Session started");
        Some(entry.publish())
    }

    pub fn submit_guess(&mut self, code: &str, slot: Slot, text: &str) -> Option<SessionSnapshot> {
        let entry = self.sessions.get_mut(code)?;
        let Some(outcome) = entry.session.submit_guess(&self.catalog, slot, text) else {
            tracing::debug!(code, ?slot, "Guess ignored");
            return None;
        };
        tracing::debug!(code, ?slot, ?outcome, "Guess judged");
        Some(entry.publish())
    }

    pub fn reset(&mut self, code: &str) -> Option<SessionSnapshot> {
        let entry = self.sessions.get_mut(code)?;
        entry.session.reset();
        tracing::info!(code, "Session reset");
        Some(entry.publish())
    }

    /// Vacate every slot held by `connection`. Sessions left with no
    /// participants are destroyed; the rest are re-broadcast.
    pub fn remove_identity(&mut self, connection: ConnectionId) -> Vec<SessionChange> {
        let affected: Vec<String> = self
            .sessions
            .iter_mut()
            .filter_map(|(code, entry)| {
                let had_sender = entry.connections.remove(&connection).is_some();
                let vacated = entry.session.clear_connection(connection);
                (had_sender || vacated).then(|| code.clone())
            })
            .collect();

        let mut changes = Vec::with_capacity(affected.len());
        for code in affected {
            let empty = self
                .sessions
                .get(&code)
                .is_some_and(|entry| entry.session.is_empty());
            if empty {
                self.sessions.remove(&code);
                tracing::info!(code = %code, "Session deleted");
                changes.push(SessionChange::Deleted(code));
            } else if let Some(snapshot) = self.broadcast_snapshot(&code) {
                tracing::info!(code = %code, connection, "Participant left");
                changes.push(SessionChange::Updated(snapshot));
            }
        }
        changes
    }

    /// Re-send the current snapshot of `code` to its participants.
    pub fn broadcast_snapshot(&self, code: &str) -> Option<SessionSnapshot> {
        self.sessions.get(code).map(SessionEntry::publish)
    }

    pub fn snapshot(&self, code: &str) -> Option<SessionSnapshot> {
        self.sessions.get(code).map(|entry| entry.session.snapshot())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.sessions.contains_key(code)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Returns (active_sessions, seated_participants).
    pub fn stats(&self) -> (usize, usize) {
        let participants = self
            .sessions
            .values()
            .map(|entry| entry.session.occupants())
            .sum();
        (self.sessions.len(), participants)
    }
}
