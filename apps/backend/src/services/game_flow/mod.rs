//! Phase orchestration. One [`GameFlow`] per room drives night, day, and
//! vote as a chain of spawned tasks; the room's session counter keeps at
//! most one chain authoritative.

mod actions;
mod day;
mod night;
mod resume;
mod vote;

#[cfg(test)]
mod tests_flow;

use std::sync::Arc;

use tracing::info;

use crate::ai::{DecisionProvider, RandomProvider};
use crate::config::game::GameConfig;
use crate::domain::roles::Role;
use crate::domain::rules::check_game_end;
use crate::domain::state::{EndResult, Game, Lifecycle, PlayerId};
use crate::protocol::{SeatInfo, ServerMsg};
use crate::services::game_room::GameRoom;
use crate::services::outbound::Outbound;

#[derive(Clone)]
pub struct GameFlow {
    pub(crate) room: Arc<GameRoom>,
    pub(crate) outbound: Arc<dyn Outbound>,
    pub(crate) provider: Arc<dyn DecisionProvider>,
    /// Random legal choices when the provider times out or misbehaves.
    pub(crate) fallback: Arc<RandomProvider>,
    pub(crate) cfg: Arc<GameConfig>,
}

impl GameFlow {
    pub fn new(
        room: Arc<GameRoom>,
        outbound: Arc<dyn Outbound>,
        provider: Arc<dyn DecisionProvider>,
        cfg: Arc<GameConfig>,
    ) -> Self {
        Self {
            room,
            outbound,
            provider,
            fallback: Arc::new(RandomProvider::new(None)),
            cfg,
        }
    }

    /// Start a fresh authoritative run at the night phase.
    pub fn spawn_night(&self) {
        let flow = self.clone();
        let token = self.room.begin_run();
        tokio::spawn(async move {
            flow.run_night(token).await;
        });
    }

    /// A run may only proceed while it is still the authoritative session
    /// and the game is actually running. Checked after every await.
    pub(crate) async fn still_live(&self, token: u64) -> bool {
        if self.room.session() != token {
            return false;
        }
        let game = self.room.game.lock().await;
        game.lifecycle == Lifecycle::Playing && !game.paused
    }

    pub(crate) fn send_to(&self, player_id: &str, msg: &ServerMsg) {
        self.outbound.send(player_id, msg);
    }

    /// Push to every connected human in the room.
    pub(crate) fn broadcast(&self, game: &Game, msg: &ServerMsg) {
        for seat in game.human_seats().filter(|s| s.is_online) {
            self.outbound.send(&seat.id, msg);
        }
    }

    /// Append a public system line and push it.
    pub(crate) fn system_message(&self, game: &mut Game, content: impl Into<String>) {
        let content = content.into();
        game.add_message("system", content.clone());
        let time = game.messages.last().map_or(0, |m| m.time);
        self.broadcast(
            game,
            &ServerMsg::Chat {
                from: "system".to_string(),
                content,
                time,
            },
        );
    }

    /// End the game: set the result, reveal all roles, invalidate the run.
    pub(crate) fn finish(&self, game: &mut Game, end: EndResult) {
        info!(room_id = %game.room_id, winner = ?end.winner, "game ended");
        game.lifecycle = Lifecycle::Ended;
        game.phase = None;
        game.end_result = Some(end.clone());
        game.touch();
        let reveal = seat_infos(game, true);
        self.broadcast(
            game,
            &ServerMsg::GameEnded {
                winner: end.winner,
                reason: end.reason,
                roles: reveal,
            },
        );
        self.room.invalidate();
    }

    /// Apply the win condition. Returns true when the game just ended.
    pub(crate) fn check_end(&self, game: &mut Game) -> bool {
        match check_game_end(game) {
            Some(end) => {
                self.finish(game, end);
                true
            }
            None => false,
        }
    }

    /// Living wolf ids, for teammate reveals and the wolf channel.
    pub(crate) fn wolf_ids(game: &Game) -> Vec<PlayerId> {
        game.alive_seats()
            .filter(|s| s.role.as_ref().map(Role::team) == Some(crate::domain::roles::Team::Wolf))
            .map(|s| s.id.clone())
            .collect()
    }
}

/// Seat list for client payloads. `reveal` includes every role (end of
/// game); otherwise roles stay hidden and per-recipient code fills in what
/// the recipient may see.
pub(crate) fn seat_infos(game: &Game, reveal: bool) -> Vec<SeatInfo> {
    game.seats
        .iter()
        .map(|s| SeatInfo {
            id: s.id.clone(),
            name: s.name.clone(),
            is_ai: s.is_ai,
            is_alive: s.is_alive,
            is_online: s.is_online,
            is_host: s.id == game.host_id,
            role: if reveal { s.role.clone() } else { None },
        })
        .collect()
}
