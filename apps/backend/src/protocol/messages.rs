use serde::{Deserialize, Serialize};

use crate::domain::roles::{Role, TargetOption};
use crate::domain::state::{ChatEntry, Death, Lifecycle, Phase, Winner};

/// Messages a client may send over the socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// First message on every connection; binds the socket to a user.
    Join {
        user_id: String,
        name: String,
    },
    CreateRoom,
    JoinRoom {
        room_id: String,
    },
    LeaveRoom,
    AddAi,
    RemoveAi,
    StartGame,
    /// Any in-game decision: a night action, a vote, a hunter shot, or
    /// `end_speech`.
    GameAction {
        action: String,
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        reason: Option<String>,
    },
    Chat {
        message: String,
        #[serde(default)]
        is_wolf_chat: bool,
    },
    GetRooms,
    PauseGame,
    ResumeGame,
    ExitGame,
}

/// One seat as shown to clients. `role` is only populated in per-player
/// payloads that may reveal it (the recipient's own seat, or wolf
/// teammates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatInfo {
    pub id: String,
    pub name: String,
    pub is_ai: bool,
    pub is_alive: bool,
    pub is_online: bool,
    pub is_host: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub host_name: String,
    pub player_count: usize,
    pub lifecycle: Lifecycle,
}

/// Messages the server pushes to clients.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    Joined {
        user_id: String,
    },
    /// Full room view for one recipient; also the resume payload after a
    /// reconnect.
    RoomState {
        room_id: String,
        host_id: String,
        lifecycle: Lifecycle,
        #[serde(skip_serializing_if = "Option::is_none")]
        phase: Option<Phase>,
        day_number: u32,
        seats: Vec<SeatInfo>,
        messages: Vec<ChatEntry>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        wolf_chat: Vec<ChatEntry>,
        paused: bool,
        /// The recipient owes a decision right now.
        #[serde(skip_serializing_if = "Option::is_none")]
        action_required: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        candidates: Vec<TargetOption>,
        #[serde(skip_serializing_if = "Option::is_none")]
        speaking_turn: Option<SpeakingTurn>,
    },
    RoomList {
        rooms: Vec<RoomSummary>,
    },
    GameStarted {
        role: Role,
        description: String,
        /// Wolf recipients get their teammates' ids.
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        teammates: Vec<String>,
    },
    PhaseChange {
        phase: Phase,
        day_number: u32,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        deaths: Vec<Death>,
    },
    /// The recipient owes a night action or a vote; `candidates` are the
    /// legal targets.
    ActionRequired {
        action: String,
        candidates: Vec<TargetOption>,
        #[serde(skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
    },
    /// Private acknowledgement of a submitted action (seer verdicts arrive
    /// here).
    ActionResult {
        success: bool,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_wolf: Option<bool>,
    },
    SpeakingTurn {
        #[serde(flatten)]
        turn: SpeakingTurn,
    },
    Chat {
        from: String,
        content: String,
        time: i64,
    },
    WolfChat {
        from: String,
        content: String,
        time: i64,
    },
    Countdown {
        seconds: u64,
        #[serde(skip_serializing_if = "std::ops::Not::not", default)]
        hide: bool,
    },
    VoteResult {
        counts: Vec<(String, u32)>,
        #[serde(skip_serializing_if = "Option::is_none")]
        eliminated: Option<String>,
        idiot_revealed: bool,
        tied: bool,
    },
    HunterShot {
        hunter: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        victim: Option<String>,
    },
    GameEnded {
        winner: Winner,
        reason: String,
        /// Full role reveal, one entry per seat.
        roles: Vec<SeatInfo>,
    },
    GamePaused,
    GameResumed,
    PlayerExited {
        user_id: String,
        name: String,
    },
    RoomClosed {
        reason: String,
    },
    LeftRoom,
    ExitedGame,
    Error {
        code: String,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakingTurn {
    pub speaker: String,
    pub speaker_name: String,
    /// 1-based position in the speaking order.
    pub position: usize,
    pub total: usize,
}
