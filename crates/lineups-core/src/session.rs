use serde::{Deserialize, Serialize};

use crate::contest::ContestCatalog;
use crate::normalize::{canonicalize, match_key};
use crate::roster::RosterIndex;

/// Server-assigned handle for one participant connection.
pub type ConnectionId = u64;

/// Strike counter ceiling. Further misses are absorbed.
pub const MAX_STRIKES: u8 = 3;

/// One of the two participant positions in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Name used when a participant joins without one.
    pub fn default_name(self) -> &'static str {
        match self {
            Self::A => "Player 1",
            Self::B => "Player 2",
        }
    }
}

/// A connected participant occupying a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub connection: ConnectionId,
    pub name: String,
}

/// Why the most recent submission was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuessError {
    #[serde(rename = "duplicate")]
    Duplicate,
    #[serde(rename = "not on roster")]
    NotOnRoster,
}

impl std::fmt::Display for GuessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate => write!(f, "Already said, strike!"),
            Self::NotOnRoster => write!(f, "Not on the starters list."),
        }
    }
}

/// Result of a submission that was processed (i.e. not ignored).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    Hit { display: String },
    Duplicate,
    NotOnRoster,
}

impl GuessOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }
}

/// Participant as exposed in a snapshot. Connection handles stay server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub name: String,
}

/// Full serializable state of a session, broadcast after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub code: String,
    pub contest_id: String,
    pub slot_a: Option<SlotView>,
    pub slot_b: Option<SlotView>,
    pub strikes_a: u8,
    pub strikes_b: u8,
    pub correct_a: Vec<String>,
    pub correct_b: Vec<String>,
    pub turn: Slot,
    pub started: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<GuessError>,
}

/// One two-participant duel.
///
/// Transitions never fail: an action that is not legal in the current state
/// returns `false`/`None` and leaves the session untouched.
#[derive(Debug, Clone)]
pub struct Session {
    code: String,
    contest_id: String,
    slot_a: Option<Participant>,
    slot_b: Option<Participant>,
    strikes_a: u8,
    strikes_b: u8,
    correct_a: Vec<String>,
    correct_b: Vec<String>,
    turn: Slot,
    started: bool,
    last_error: Option<GuessError>,
}

impl Session {
    pub fn new(code: String, contest_id: String, host: Participant) -> Self {
        Self {
            code,
            contest_id,
            slot_a: Some(host),
            slot_b: None,
            strikes_a: 0,
            strikes_b: 0,
            correct_a: Vec::new(),
            correct_b: Vec::new(),
            turn: Slot::A,
            started: false,
            last_error: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn contest_id(&self) -> &str {
        &self.contest_id
    }

    pub fn turn(&self) -> Slot {
        self.turn
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn last_error(&self) -> Option<GuessError> {
        self.last_error
    }

    pub fn participant(&self, slot: Slot) -> Option<&Participant> {
        match slot {
            Slot::A => self.slot_a.as_ref(),
            Slot::B => self.slot_b.as_ref(),
        }
    }

    pub fn strikes(&self, slot: Slot) -> u8 {
        match slot {
            Slot::A => self.strikes_a,
            Slot::B => self.strikes_b,
        }
    }

    pub fn correct(&self, slot: Slot) -> &[String] {
        match slot {
            Slot::A => &self.correct_a,
            Slot::B => &self.correct_b,
        }
    }

    pub fn is_full(&self) -> bool {
        self.slot_a.is_some() && self.slot_b.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.slot_a.is_none() && self.slot_b.is_none()
    }

    pub fn occupants(&self) -> usize {
        usize::from(self.slot_a.is_some()) + usize::from(self.slot_b.is_some())
    }

    /// Slot held by a connection, if any.
    pub fn slot_of(&self, connection: ConnectionId) -> Option<Slot> {
        [Slot::A, Slot::B]
            .into_iter()
            .find(|&slot| self.participant(slot).is_some_and(|p| p.connection == connection))
    }

    /// Seat a guest in slot B. Returns `false` if slot B is already taken.
    pub fn seat_guest(&mut self, guest: Participant) -> bool {
        if self.slot_b.is_some() {
            return false;
        }
        self.slot_b = Some(guest);
        true
    }

    /// Empty every slot held by `connection`. Returns whether anything changed.
    pub fn clear_connection(&mut self, connection: ConnectionId) -> bool {
        let mut changed = false;
        for slot in [&mut self.slot_a, &mut self.slot_b] {
            if slot.as_ref().is_some_and(|p| p.connection == connection) {
                *slot = None;
                changed = true;
            }
        }
        changed
    }

    /// Switch contest. Ignored once started or when the id is unknown.
    pub fn select_contest(&mut self, catalog: &ContestCatalog, contest_id: &str) -> bool {
        if self.started || !catalog.contains(contest_id) {
            return false;
        }
        self.contest_id = contest_id.to_string();
        true
    }

    /// Begin the duel with a clean score sheet. Requires both slots filled.
    pub fn start(&mut self) -> bool {
        if !self.is_full() {
            return false;
        }
        self.clear_score();
        self.started = true;
        true
    }

    /// Return to the lobby with a clean score sheet.
    pub fn reset(&mut self) {
        self.clear_score();
        self.started = false;
    }

    fn clear_score(&mut self) {
        self.strikes_a = 0;
        self.strikes_b = 0;
        self.correct_a.clear();
        self.correct_b.clear();
        self.turn = Slot::A;
        self.last_error = None;
    }

    /// Judge one guess from `slot`.
    ///
    /// Ignored (returns `None`) before start, for an empty slot, out of
    /// turn, or for blank text. Otherwise the guess scores or strikes, and
    /// the turn passes to the other slot either way.
    pub fn submit_guess(
        &mut self,
        catalog: &ContestCatalog,
        slot: Slot,
        raw: &str,
    ) -> Option<GuessOutcome> {
        if !self.started || self.participant(slot).is_none() || slot != self.turn {
            return None;
        }
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let index = catalog.index(&self.contest_id)?;

        let key = match_key(raw);
        let outcome = if !index.accepts(&key) {
            GuessOutcome::NotOnRoster
        } else if self.already_said(&key, index) {
            GuessOutcome::Duplicate
        } else {
            let display = index.display_for(&key).unwrap_or(raw).to_string();
            GuessOutcome::Hit { display }
        };

        match &outcome {
            GuessOutcome::Hit { display } => {
                self.correct_mut(slot).push(display.clone());
                self.last_error = None;
            },
            GuessOutcome::Duplicate => self.strike(slot, GuessError::Duplicate),
            GuessOutcome::NotOnRoster => self.strike(slot, GuessError::NotOnRoster),
        }
        self.turn = slot.other();

        Some(outcome)
    }

    /// A key is taken if it canonicalizes to, or resolves to the same
    /// starter as, any answer already accepted on either side.
    fn already_said(&self, key: &str, index: &RosterIndex) -> bool {
        let display = index.display_for(key);
        self.correct_a
            .iter()
            .chain(&self.correct_b)
            .any(|said| canonicalize(said) == key || display == Some(said.as_str()))
    }

    fn strike(&mut self, slot: Slot, reason: GuessError) {
        let strikes = match slot {
            Slot::A => &mut self.strikes_a,
            Slot::B => &mut self.strikes_b,
        };
        *strikes = (*strikes + 1).min(MAX_STRIKES);
        self.last_error = Some(reason);
    }

    fn correct_mut(&mut self, slot: Slot) -> &mut Vec<String> {
        match slot {
            Slot::A => &mut self.correct_a,
            Slot::B => &mut self.correct_b,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let view = |p: &Option<Participant>| {
            p.as_ref().map(|p| SlotView {
                name: p.name.clone(),
            })
        };
        SessionSnapshot {
            code: self.code.clone(),
            contest_id: self.contest_id.clone(),
            slot_a: view(&self.slot_a),
            slot_b: view(&self.slot_b),
            strikes_a: self.strikes_a,
            strikes_b: self.strikes_b,
            correct_a: self.correct_a.clone(),
            correct_b: self.correct_b.clone(),
            turn: self.turn,
            started: self.started,
            last_error: self.last_error,
        }
    }
}
