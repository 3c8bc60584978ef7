//! Day phase: announce the night's deaths, then run the speaking order.

use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use super::GameFlow;
use crate::ai::DecisionProvider;
use crate::domain::player_view::PlayerView;
use crate::domain::state::{Death, Phase, PlayerId};
use crate::protocol::messages::SpeakingTurn;
use crate::protocol::ServerMsg;

impl GameFlow {
    pub(crate) async fn run_day(&self, token: u64, deaths: Vec<Death>) {
        {
            let mut game = self.room.game.lock().await;
            if game.phase == Some(Phase::Day) || game.lifecycle != crate::domain::state::Lifecycle::Playing {
                return;
            }
            game.phase = Some(Phase::Day);
            game.speaking_order = game.alive_seats().map(|s| s.id.clone()).collect();
            game.current_speaker = None;
            game.current_speaker_index = 0;
            game.touch();
            info!(room_id = %game.room_id, day = game.day_number, deaths = deaths.len(), "day begins");
            self.broadcast(
                &game,
                &ServerMsg::PhaseChange {
                    phase: Phase::Day,
                    day_number: game.day_number,
                    deaths: deaths.clone(),
                },
            );
            if deaths.is_empty() {
                self.system_message(&mut game, "Dawn breaks. It was a quiet night; nobody died.");
            } else {
                let names: Vec<String> = deaths
                    .iter()
                    .map(|d| {
                        game.seat(&d.id)
                            .map_or_else(|| d.id.clone(), |s| s.name.clone())
                    })
                    .collect();
                self.system_message(
                    &mut game,
                    format!("Dawn breaks. Last night we lost: {}.", names.join(", ")),
                );
            }
        }

        self.speak_from(token, 0).await;
    }

    /// Run the speaking order from `start` (0-based), then move to the
    /// vote. Re-entry point after a resume: `start` is the interrupted
    /// speaker's position.
    pub(crate) async fn speak_from(&self, token: u64, start: usize) {
        let order: Vec<PlayerId> = {
            let game = self.room.game.lock().await;
            game.speaking_order.clone()
        };
        let total = order.len();
        for (index, speaker) in order.into_iter().enumerate().skip(start) {
            if !self.still_live(token).await {
                return;
            }
            let is_ai = {
                let mut game = self.room.game.lock().await;
                let Some(seat) = game.seat(&speaker) else { continue };
                if !seat.is_alive {
                    continue;
                }
                let is_ai = seat.is_ai;
                let turn = SpeakingTurn {
                    speaker: speaker.clone(),
                    speaker_name: seat.name.clone(),
                    position: index + 1,
                    total,
                };
                game.current_speaker = Some(speaker.clone());
                game.current_speaker_index = index + 1;
                self.broadcast(&game, &ServerMsg::SpeakingTurn { turn });
                is_ai
            };

            if is_ai {
                self.ai_speech(token, &speaker).await;
            } else {
                self.human_speech(token, &speaker).await;
            }
            if !self.still_live(token).await {
                return;
            }
        }

        {
            let mut game = self.room.game.lock().await;
            game.current_speaker = None;
        }
        self.run_vote(token).await;
    }

    /// Ask the provider for one to three lines and pace them out.
    async fn ai_speech(&self, token: u64, speaker: &str) {
        sleep(self.cfg.speech_lead_in).await;
        if !self.still_live(token).await {
            return;
        }
        let view = {
            let game = self.room.game.lock().await;
            PlayerView::for_seat(&game, speaker)
        };
        let Some(view) = view else { return };
        let lines = match timeout(self.cfg.provider_timeout, self.provider.speak(&view)).await {
            Ok(Ok(lines)) => lines,
            _ => {
                warn!(speaker, "provider speech failed, using fallback");
                self.fallback.speak(&view).await.unwrap_or_default()
            }
        };

        for (i, line) in lines.into_iter().enumerate() {
            if i > 0 {
                sleep(self.cfg.speech_gap).await;
            }
            if !self.still_live(token).await {
                return;
            }
            let mut game = self.room.game.lock().await;
            let name = game
                .seat(speaker)
                .map_or_else(|| speaker.to_string(), |s| s.name.clone());
            game.add_message(name.clone(), line.clone());
            let time = game.messages.last().map_or(0, |m| m.time);
            self.broadcast(
                &game,
                &ServerMsg::Chat {
                    from: name,
                    content: line,
                    time,
                },
            );
        }
    }

    /// Wait for a human to finish, with a hard ceiling. A speaker who said
    /// nothing gets a system line so the table knows the turn happened.
    async fn human_speech(&self, token: u64, speaker: &str) {
        let spoken_before = {
            let game = self.room.game.lock().await;
            messages_from(&game, speaker)
        };
        let ended = timeout(self.cfg.speech_timeout, async {
            loop {
                self.room.speech_notify.notified().await;
                let game = self.room.game.lock().await;
                if game.current_speaker.as_deref() != Some(speaker) {
                    return;
                }
            }
        })
        .await
        .is_ok();

        if self.room.session() != token {
            return;
        }
        let mut game = self.room.game.lock().await;
        if !ended {
            game.current_speaker = None;
        }
        if messages_from(&game, speaker) == spoken_before {
            let name = game
                .seat(speaker)
                .map_or_else(|| speaker.to_string(), |s| s.name.clone());
            self.system_message(&mut game, format!("{name} said nothing."));
        }
    }
}

fn messages_from(game: &crate::domain::state::Game, speaker: &str) -> usize {
    let name = game.seat(speaker).map(|s| s.name.clone());
    game.messages
        .iter()
        .filter(|m| Some(&m.from) == name.as_ref())
        .count()
}
