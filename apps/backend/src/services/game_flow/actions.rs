//! Inbound player decisions: night actions, votes, the hunter shot,
//! end-of-speech, and chat. The ws layer calls these; so do the AI paths
//! for their submissions.

use serde_json::json;
use tracing::debug;

use super::GameFlow;
use crate::domain::roles::{action_result, Role, Team};
use crate::domain::state::{Lifecycle, NightAction, NightActionKind, Phase};
use crate::error::AppError;
use crate::errors::domain::{ActionErrorKind, DomainError};
use crate::protocol::ServerMsg;

impl GameFlow {
    pub async fn handle_action(
        &self,
        player_id: &str,
        action: &str,
        target: Option<String>,
        _reason: Option<String>,
    ) -> Result<(), AppError> {
        match action {
            "end_speech" => self.end_speech(player_id).await,
            "vote" => self.cast_vote(player_id, target).await,
            "hunter_shoot" => self.hunter_shot(player_id, target).await,
            other => self.night_action(player_id, other, target).await,
        }
    }

    async fn end_speech(&self, player_id: &str) -> Result<(), AppError> {
        let mut game = self.room.game.lock().await;
        if game.current_speaker.as_deref() != Some(player_id) {
            return Err(DomainError::invalid_action(
                ActionErrorKind::OutOfTurn,
                "it is not your turn to speak",
            )
            .into());
        }
        game.current_speaker = None;
        game.touch();
        self.room.speech_notify.notify_waiters();
        Ok(())
    }

    async fn cast_vote(&self, player_id: &str, target: Option<String>) -> Result<(), AppError> {
        let target = target.ok_or_else(|| {
            DomainError::invalid_action(ActionErrorKind::UnknownTarget, "vote needs a target")
        })?;
        let mut game = self.room.game.lock().await;
        if game.phase != Some(Phase::Vote) {
            return Err(DomainError::invalid_action(
                ActionErrorKind::WrongPhase,
                "voting is not open",
            )
            .into());
        }
        if !game.eligible_voters().any(|s| s.id == player_id) {
            return Err(DomainError::invalid_action(
                ActionErrorKind::NotEligible,
                "you cannot vote",
            )
            .into());
        }
        if !game.seat(&target).is_some_and(|s| s.is_alive) {
            return Err(DomainError::invalid_action(
                ActionErrorKind::UnknownTarget,
                "vote target is not a living player",
            )
            .into());
        }
        let already = game.votes.contains_key(player_id);
        game.votes.insert(player_id.to_string(), target);
        game.touch();
        debug!(player_id, already, "vote recorded");
        self.send_to(
            player_id,
            &ServerMsg::ActionResult {
                success: true,
                message: "Vote recorded.".to_string(),
                is_wolf: None,
            },
        );
        self.room.vote_notify.notify_waiters();
        Ok(())
    }

    async fn hunter_shot(&self, player_id: &str, target: Option<String>) -> Result<(), AppError> {
        let mut game = self.room.game.lock().await;
        if game.pending_hunter_shot.as_deref() != Some(player_id) {
            return Err(DomainError::invalid_action(
                ActionErrorKind::OutOfTurn,
                "no shot is pending for you",
            )
            .into());
        }
        self.apply_hunter_shot(&mut game, player_id, target.as_deref());
        self.room.shot_notify.notify_waiters();
        Ok(())
    }

    /// A night submission from a human. The action string is the wire form
    /// of [`NightActionKind`].
    async fn night_action(
        &self,
        player_id: &str,
        action: &str,
        target: Option<String>,
    ) -> Result<(), AppError> {
        let kind: NightActionKind = serde_json::from_value(json!(action)).map_err(|_| {
            DomainError::invalid_action(
                ActionErrorKind::Other(action.to_string()),
                "unknown action",
            )
        })?;
        let mut game = self.room.game.lock().await;
        if game.phase != Some(Phase::Night) {
            return Err(DomainError::invalid_action(
                ActionErrorKind::WrongPhase,
                "night actions are only legal at night",
            )
            .into());
        }
        if !game.seat(player_id).is_some_and(|s| s.is_alive) {
            return Err(DomainError::invalid_action(
                ActionErrorKind::NotAlive,
                "dead players do not act",
            )
            .into());
        }
        if game.night_action(player_id).is_some() {
            return Err(DomainError::invalid_action(
                ActionErrorKind::AlreadyActed,
                "you have already acted tonight",
            )
            .into());
        }

        // A save has an implicit target: tonight's victim.
        let target = match kind {
            NightActionKind::Save => game.dead_tonight.clone(),
            _ => target,
        };
        let submitted = NightAction {
            action: kind,
            target,
        };

        match action_result(&game, player_id, &submitted) {
            Some(result) => {
                if result.success {
                    game.record_night_action(player_id.to_string(), submitted);
                }
                game.touch();
                self.send_to(
                    player_id,
                    &ServerMsg::ActionResult {
                        success: result.success,
                        message: result.message,
                        is_wolf: result.is_wolf,
                    },
                );
                Ok(())
            }
            None => {
                if kind == NightActionKind::None {
                    game.record_night_action(player_id.to_string(), submitted);
                    game.touch();
                    return Ok(());
                }
                Err(DomainError::invalid_action(
                    ActionErrorKind::NotEligible,
                    "your role cannot do that",
                )
                .into())
            }
        }
    }

    /// Chat routing. Dead seats stay silent while the game runs; wolves
    /// talking at night land in the wolf channel automatically.
    pub async fn handle_chat(
        &self,
        player_id: &str,
        message: String,
        is_wolf_chat: bool,
    ) -> Result<(), AppError> {
        let mut game = self.room.game.lock().await;
        let Some(seat) = game.seat(player_id) else {
            return Err(AppError::not_found(
                "SEAT_NOT_FOUND",
                "you are not seated".to_string(),
            ));
        };
        let name = seat.name.clone();
        let is_wolf = seat.role.as_ref().map(Role::team) == Some(Team::Wolf);
        let playing = game.lifecycle == Lifecycle::Playing;
        if playing && !seat.is_alive {
            return Err(DomainError::invalid_action(
                ActionErrorKind::NotAlive,
                "the dead do not speak",
            )
            .into());
        }

        let wolf_channel = playing && is_wolf && (is_wolf_chat || game.phase == Some(Phase::Night));
        if wolf_channel {
            game.add_wolf_message(name.clone(), message.clone());
            let time = game.wolf_chat.last().map_or(0, |m| m.time);
            let msg = ServerMsg::WolfChat {
                from: name,
                content: message,
                time,
            };
            for id in Self::wolf_ids(&game) {
                if game.seat(&id).is_some_and(|s| !s.is_ai && s.is_online) {
                    self.send_to(&id, &msg);
                }
            }
        } else {
            if is_wolf_chat {
                return Err(DomainError::invalid_action(
                    ActionErrorKind::NotEligible,
                    "you are not in that channel",
                )
                .into());
            }
            if playing && game.phase == Some(Phase::Night) {
                return Err(DomainError::invalid_action(
                    ActionErrorKind::WrongPhase,
                    "the village sleeps; wait for daybreak",
                )
                .into());
            }
            game.add_message(name.clone(), message.clone());
            let time = game.messages.last().map_or(0, |m| m.time);
            self.broadcast(
                &game,
                &ServerMsg::Chat {
                    from: name,
                    content: message,
                    time,
                },
            );
        }
        game.touch();
        Ok(())
    }
}
