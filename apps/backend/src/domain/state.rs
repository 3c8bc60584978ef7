use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::roles::{Role, RoleKind};

/// Stable participant identifier within a room ("user_…" or "ai_…").
pub type PlayerId = String;

/// Room lifecycle.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Room created, seats still joining.
    Waiting,
    /// Roles assigned, phase loop running.
    Playing,
    /// Terminal; the aggregate is retained for a grace period only.
    Ended,
}

/// Recurring phase cycle while playing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Night,
    Day,
    Vote,
}

/// Why a seat died. Drives death triggers (a poisoned hunter cannot shoot).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Wolf,
    Poison,
    Vote,
    Hunter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Death {
    pub id: PlayerId,
    pub cause: DeathCause,
}

/// One participant slot. Created on join; departure removes the slot while
/// waiting, but a seat is never destroyed mid-game.
#[derive(Debug, Clone, PartialEq)]
pub struct Seat {
    pub id: PlayerId,
    pub name: String,
    pub is_ai: bool,
    pub is_alive: bool,
    pub is_online: bool,
    pub can_vote: bool,
    /// None until `start()` assigns roles.
    pub role: Option<Role>,
}

impl Seat {
    pub fn new(id: PlayerId, name: impl Into<String>, is_ai: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_ai,
            is_alive: true,
            is_online: true,
            can_vote: true,
            role: None,
        }
    }

    pub fn role_kind(&self) -> Option<RoleKind> {
        self.role.as_ref().map(Role::kind)
    }
}

/// A submitted night action. `target` is absent for "none" and for witch
/// saves arriving from the decision provider (completed with the computed
/// kill target by the caller).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightAction {
    pub action: NightActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NightActionKind {
    #[serde(alias = "wolf")]
    Kill,
    #[serde(alias = "seer")]
    Check,
    Save,
    Poison,
    Guard,
    None,
}

/// One chat log entry. `from` is a seat display name or the reserved
/// senders "system" / "host".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub from: String,
    pub content: String,
    /// Unix millis.
    pub time: i64,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Wolf,
    Villager,
    /// Game abandoned (all humans gone) rather than won.
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndResult {
    pub winner: Winner,
    pub reason: String,
}

/// Aggregate root for one room. All mutation happens on sequential steps of
/// the single live orchestration run for this game; see the services layer
/// for the session-counter discipline.
#[derive(Debug, Clone)]
pub struct Game {
    pub room_id: String,
    pub host_id: PlayerId,
    pub lifecycle: Lifecycle,
    /// None while waiting and after the game ends.
    pub phase: Option<Phase>,
    /// Starts 0; increments on entering each night.
    pub day_number: u32,

    /// Seats in join order. Join order is also pseudonym order.
    pub seats: Vec<Seat>,

    /// Submission-ordered night actions for the current night. Order matters:
    /// the wolf kill tie-break is "first target to reach the max count".
    pub night_actions: Vec<(PlayerId, NightAction)>,
    /// voter -> target for the current vote round.
    pub votes: HashMap<PlayerId, PlayerId>,

    /// Previous night's guard target (no consecutive guard rule).
    pub last_guarded: Option<PlayerId>,
    /// Kill target computed once all wolves have acted.
    pub dead_tonight: Option<PlayerId>,
    /// Hunter seat whose death shot has not been fired yet.
    pub pending_hunter_shot: Option<PlayerId>,

    /// Append-only public log.
    pub messages: Vec<ChatEntry>,
    /// Wolf-channel log, only ever shown to wolves.
    pub wolf_chat: Vec<ChatEntry>,

    /// Fixed order of living seats computed at day start.
    pub speaking_order: Vec<PlayerId>,
    pub current_speaker: Option<PlayerId>,
    /// 1-based position of the current speaker for display.
    pub current_speaker_index: usize,

    pub paused: bool,
    /// Stable per-game masking bijection: seat id -> "pN", computed once at
    /// game start so consecutive decision requests see consistent ids.
    pub pseudonyms: HashMap<PlayerId, String>,

    pub end_result: Option<EndResult>,
    /// Unix millis, for cleanup thresholds.
    pub last_activity: i64,
    pub created_at: i64,
}

impl Game {
    pub fn new(room_id: impl Into<String>, host_id: PlayerId) -> Self {
        let now = now_millis();
        Self {
            room_id: room_id.into(),
            host_id,
            lifecycle: Lifecycle::Waiting,
            phase: None,
            day_number: 0,
            seats: Vec::new(),
            night_actions: Vec::new(),
            votes: HashMap::new(),
            last_guarded: None,
            dead_tonight: None,
            pending_hunter_shot: None,
            messages: Vec::new(),
            wolf_chat: Vec::new(),
            speaking_order: Vec::new(),
            current_speaker: None,
            current_speaker_index: 0,
            paused: false,
            pseudonyms: HashMap::new(),
            end_result: None,
            last_activity: now,
            created_at: now,
        }
    }

    pub fn add_seat(&mut self, id: PlayerId, name: impl Into<String>, is_ai: bool) {
        self.seats.push(Seat::new(id, name, is_ai));
    }

    /// Remove a seat while waiting. The host leaving dissolves the room
    /// instead, so no seat ever inherits it.
    pub fn remove_seat(&mut self, id: &str) {
        self.seats.retain(|s| s.id != id);
    }

    pub fn seat(&self, id: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == id)
    }

    pub fn seat_mut(&mut self, id: &str) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.id == id)
    }

    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    pub fn alive_seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| s.is_alive)
    }

    pub fn alive_with_role(&self, kind: RoleKind) -> impl Iterator<Item = &Seat> {
        self.alive_seats()
            .filter(move |s| s.role_kind() == Some(kind))
    }

    pub fn human_seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| !s.is_ai)
    }

    pub fn night_action(&self, id: &str) -> Option<&NightAction> {
        self.night_actions
            .iter()
            .find(|(pid, _)| pid == id)
            .map(|(_, a)| a)
    }

    pub fn record_night_action(&mut self, id: PlayerId, action: NightAction) -> bool {
        if self.night_action(&id).is_some() {
            return false;
        }
        self.night_actions.push((id, action));
        true
    }

    pub fn add_message(&mut self, from: impl Into<String>, content: impl Into<String>) {
        self.messages.push(ChatEntry {
            from: from.into(),
            content: content.into(),
            time: now_millis(),
        });
    }

    pub fn add_wolf_message(&mut self, from: impl Into<String>, content: impl Into<String>) {
        self.wolf_chat.push(ChatEntry {
            from: from.into(),
            content: content.into(),
            time: now_millis(),
        });
    }

    /// Recompute the masking bijection from seat order. Called once when
    /// the game starts and again after a snapshot restore.
    pub fn rebuild_pseudonyms(&mut self) {
        self.pseudonyms = self
            .seats
            .iter()
            .enumerate()
            .map(|(index, seat)| (seat.id.clone(), format!("p{}", index + 1)))
            .collect();
    }

    pub fn touch(&mut self) {
        self.last_activity = now_millis();
    }

    /// Seats eligible to vote right now (alive and not stripped by an
    /// idiot reveal).
    pub fn eligible_voters(&self) -> impl Iterator<Item = &Seat> {
        self.alive_seats().filter(|s| s.can_vote)
    }
}

pub fn now_millis() -> i64 {
    let now = time::OffsetDateTime::now_utc();
    (now.unix_timestamp_nanos() / 1_000_000) as i64
}
