//! Vote phase: a ticking countdown that resolves early once every eligible
//! voter has voted. Resolution happens only here, at the single point the
//! countdown run owns, so a late vote can never eliminate twice.

use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tracing::{info, warn};

use super::GameFlow;
use crate::ai::DecisionProvider;
use crate::domain::player_view::PlayerView;
use crate::domain::state::{Phase, PlayerId};
use crate::domain::vote::resolve_vote;
use crate::protocol::ServerMsg;

impl GameFlow {
    pub(crate) async fn run_vote(&self, token: u64) {
        {
            let mut game = self.room.game.lock().await;
            if game.lifecycle != crate::domain::state::Lifecycle::Playing {
                return;
            }
            game.phase = Some(Phase::Vote);
            game.votes.clear();
            game.touch();
            info!(room_id = %game.room_id, day = game.day_number, "vote begins");
            self.system_message(&mut game, "Discussion is over. The village votes.");
            let candidates: Vec<crate::domain::roles::TargetOption> = game
                .alive_seats()
                .map(|s| crate::domain::roles::TargetOption {
                    id: s.id.clone(),
                    name: s.name.clone(),
                    action: None,
                    label: None,
                })
                .collect();
            for seat in game.eligible_voters().filter(|s| !s.is_ai && s.is_online) {
                self.send_to(
                    &seat.id,
                    &ServerMsg::ActionRequired {
                        action: "vote".to_string(),
                        candidates: candidates.clone(),
                        prompt: Some("Vote for the player you suspect.".to_string()),
                    },
                );
            }
        }
        self.spawn_ai_votes(token).await;

        // One countdown run owns resolution. Each second ticks out to the
        // room; an incoming vote wakes the select early.
        let deadline = Instant::now() + self.cfg.vote_time;
        loop {
            if !self.still_live(token).await {
                return;
            }
            let (all_in, remaining) = {
                let game = self.room.game.lock().await;
                let eligible = game.eligible_voters().count();
                let all_in = game.votes.len() >= eligible && eligible > 0;
                let remaining = deadline.saturating_duration_since(Instant::now());
                if !all_in {
                    self.broadcast(
                        &game,
                        &ServerMsg::Countdown {
                            seconds: remaining.as_secs(),
                            hide: false,
                        },
                    );
                }
                (all_in, remaining)
            };
            if all_in || remaining.is_zero() {
                break;
            }
            let tick = remaining.min(Duration::from_secs(1));
            let _ = timeout(tick, self.room.vote_notify.notified()).await;
        }

        {
            let game = self.room.game.lock().await;
            self.broadcast(
                &game,
                &ServerMsg::Countdown {
                    seconds: 0,
                    hide: true,
                },
            );
        }
        if !self.still_live(token).await {
            return;
        }

        {
            let mut game = self.room.game.lock().await;
            if game.phase != Some(Phase::Vote) {
                return;
            }
            let outcome = resolve_vote(&mut game);
            game.touch();
            let counts: Vec<(String, u32)> = outcome
                .counts
                .iter()
                .map(|(id, n)| {
                    let name = game.seat(id).map_or_else(|| id.clone(), |s| s.name.clone());
                    (name, *n)
                })
                .collect();
            self.broadcast(
                &game,
                &ServerMsg::VoteResult {
                    counts,
                    eliminated: outcome.eliminated.clone(),
                    idiot_revealed: outcome.idiot_revealed,
                    tied: outcome.tied,
                },
            );
            match (&outcome.eliminated, outcome.idiot_revealed, outcome.tied) {
                (_, _, true) => {
                    self.system_message(&mut game, "The vote is tied. Nobody is eliminated.");
                }
                (Some(id), true, _) => {
                    let name = game.seat(id).map_or_else(|| id.clone(), |s| s.name.clone());
                    self.system_message(
                        &mut game,
                        format!("{name} turns out to be the idiot! They survive, but lose their vote."),
                    );
                }
                (Some(id), false, _) => {
                    let name = game.seat(id).map_or_else(|| id.clone(), |s| s.name.clone());
                    self.system_message(&mut game, format!("The village has voted out {name}."));
                }
                (None, _, _) => {}
            }
        }

        if !self.resolve_pending_hunter(token).await {
            return;
        }
        {
            let mut game = self.room.game.lock().await;
            if self.check_end(&mut game) {
                return;
            }
        }
        if !self.still_live(token).await {
            return;
        }
        // The phase chain loops back into night here; box the call so the
        // combined future stays finite.
        Box::pin(self.run_night(token)).await;
    }

    async fn spawn_ai_votes(&self, token: u64) {
        let voters: Vec<PlayerId> = {
            let game = self.room.game.lock().await;
            game.eligible_voters()
                .filter(|s| s.is_ai)
                .map(|s| s.id.clone())
                .collect()
        };
        for voter in voters {
            let flow = self.clone();
            tokio::spawn(async move {
                flow.ai_vote(token, voter).await;
            });
        }
    }

    async fn ai_vote(&self, token: u64, voter: PlayerId) {
        sleep(self.cfg.speech_lead_in).await;
        if !self.still_live(token).await {
            return;
        }
        let (view, candidates) = {
            let game = self.room.game.lock().await;
            let Some(view) = PlayerView::for_seat(&game, &voter) else {
                return;
            };
            let candidates: Vec<String> = game
                .alive_seats()
                .filter(|s| s.id != voter)
                .filter_map(|s| game.pseudonyms.get(&s.id).cloned())
                .collect();
            (view, candidates)
        };
        let decision = match timeout(self.cfg.provider_timeout, self.provider.vote(&view, &candidates))
            .await
        {
            Ok(Ok(decision)) => decision,
            _ => {
                warn!(voter = %voter, "provider vote failed, using fallback");
                match self.fallback.vote(&view, &candidates).await {
                    Ok(decision) => decision,
                    Err(_) => return,
                }
            }
        };
        if !self.still_live(token).await {
            return;
        }
        let Some(target) = decision
            .target
            .as_deref()
            .and_then(|alias| view.unmask(alias).cloned())
        else {
            return;
        };
        let mut game = self.room.game.lock().await;
        if game.phase == Some(Phase::Vote)
            && game.eligible_voters().any(|s| s.id == voter)
            && game.seat(&target).is_some_and(|s| s.is_alive)
        {
            game.votes.insert(voter, target);
            self.room.vote_notify.notify_waiters();
        }
    }
}
