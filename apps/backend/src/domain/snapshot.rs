//! Serializable snapshot of a full game, used for crash-safe persistence.
//!
//! The snapshot mirrors [`Game`] field for field, including in-flight night
//! actions, per-seat role counters, and the pending hunter shot, so a room
//! restored mid-phase can resume exactly where it stopped.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::roles::Role;
use crate::domain::state::{
    ChatEntry, EndResult, Game, Lifecycle, NightAction, Phase, PlayerId, Seat,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub is_ai: bool,
    pub is_alive: bool,
    pub can_vote: bool,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub room_id: String,
    pub host_id: PlayerId,
    pub lifecycle: Lifecycle,
    pub phase: Option<Phase>,
    pub day_number: u32,
    pub seats: Vec<SeatSnapshot>,
    pub night_actions: Vec<(PlayerId, NightAction)>,
    pub votes: HashMap<PlayerId, PlayerId>,
    pub last_guarded: Option<PlayerId>,
    pub dead_tonight: Option<PlayerId>,
    pub pending_hunter_shot: Option<PlayerId>,
    pub messages: Vec<ChatEntry>,
    pub wolf_chat: Vec<ChatEntry>,
    pub speaking_order: Vec<PlayerId>,
    pub current_speaker: Option<PlayerId>,
    pub current_speaker_index: usize,
    pub end_result: Option<EndResult>,
    pub last_activity: i64,
    pub created_at: i64,
}

/// Capture the full game state.
pub fn snapshot(game: &Game) -> GameSnapshot {
    GameSnapshot {
        room_id: game.room_id.clone(),
        host_id: game.host_id.clone(),
        lifecycle: game.lifecycle,
        phase: game.phase,
        day_number: game.day_number,
        seats: game
            .seats
            .iter()
            .map(|s| SeatSnapshot {
                id: s.id.clone(),
                name: s.name.clone(),
                is_ai: s.is_ai,
                is_alive: s.is_alive,
                can_vote: s.can_vote,
                role: s.role.clone(),
            })
            .collect(),
        night_actions: game.night_actions.clone(),
        votes: game.votes.clone(),
        last_guarded: game.last_guarded.clone(),
        dead_tonight: game.dead_tonight.clone(),
        pending_hunter_shot: game.pending_hunter_shot.clone(),
        messages: game.messages.clone(),
        wolf_chat: game.wolf_chat.clone(),
        speaking_order: game.speaking_order.clone(),
        current_speaker: game.current_speaker.clone(),
        current_speaker_index: game.current_speaker_index,
        end_result: game.end_result.clone(),
        last_activity: game.last_activity,
        created_at: game.created_at,
    }
}

/// Rebuild a game from a snapshot. Human seats come back offline (their
/// sockets are gone) and a playing game comes back paused until the host
/// resumes it.
pub fn restore(snap: GameSnapshot) -> Game {
    let mut game = Game::new(snap.room_id, snap.host_id.clone());
    game.lifecycle = snap.lifecycle;
    game.phase = snap.phase;
    game.day_number = snap.day_number;
    game.seats = snap
        .seats
        .into_iter()
        .map(|s| {
            let mut seat = Seat::new(s.id, s.name, s.is_ai);
            seat.is_alive = s.is_alive;
            seat.can_vote = s.can_vote;
            seat.role = s.role;
            seat.is_online = seat.is_ai;
            seat
        })
        .collect();
    game.night_actions = snap.night_actions;
    game.votes = snap.votes;
    game.last_guarded = snap.last_guarded;
    game.dead_tonight = snap.dead_tonight;
    game.pending_hunter_shot = snap.pending_hunter_shot;
    game.messages = snap.messages;
    game.wolf_chat = snap.wolf_chat;
    game.speaking_order = snap.speaking_order;
    game.current_speaker = snap.current_speaker;
    game.current_speaker_index = snap.current_speaker_index;
    game.end_result = snap.end_result;
    game.last_activity = snap.last_activity;
    game.created_at = snap.created_at;
    game.paused = game.lifecycle == Lifecycle::Playing;
    game.rebuild_pseudonyms();
    game
}
