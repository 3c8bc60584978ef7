//! Night phase: prompt the acting roles, collect their submissions, resolve
//! deaths, and hand over to day.

use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use super::GameFlow;
use crate::ai::DecisionProvider;
use crate::domain::night::{calculate_wolf_kill, resolve_night};
use crate::domain::player_view::PlayerView;
use crate::domain::roles::{possible_targets, RoleKind, TargetOption};
use crate::domain::state::{Game, NightAction, Phase, PlayerId};
use crate::protocol::ServerMsg;

/// Roles prompted at nightfall. The witch is prompted separately once the
/// wolves have converged, so her prompt can show tonight's victim.
const FIRST_WAVE: &[RoleKind] = &[RoleKind::Guard, RoleKind::Wolf, RoleKind::Seer];

/// Every role the night waits on, first wave plus the witch.
const NIGHT_ROLES: &[RoleKind] = &[
    RoleKind::Guard,
    RoleKind::Wolf,
    RoleKind::Seer,
    RoleKind::Witch,
];

impl GameFlow {
    pub(crate) async fn run_night(&self, token: u64) {
        {
            let mut game = self.room.game.lock().await;
            if game.lifecycle != crate::domain::state::Lifecycle::Playing {
                return;
            }
            game.day_number += 1;
            game.phase = Some(Phase::Night);
            game.night_actions.clear();
            game.dead_tonight = None;
            game.votes.clear();
            game.touch();
            info!(room_id = %game.room_id, night = game.day_number, "night begins");
            self.broadcast(
                &game,
                &ServerMsg::PhaseChange {
                    phase: Phase::Night,
                    day_number: game.day_number,
                    deaths: Vec::new(),
                },
            );
            let night = game.day_number;
            self.system_message(&mut game, format!("Night {night} falls. The village sleeps."));
        }
        self.night_continue(token).await;
    }

    /// Everything past nightfall. Also the re-entry point after a resume or
    /// a restart: prompts go out again for whoever has not acted yet.
    pub(crate) async fn night_continue(&self, token: u64) {
        {
            let game = self.room.game.lock().await;
            if game.phase != Some(Phase::Night) {
                return;
            }
            self.prompt_human_actors(&game, FIRST_WAVE);
        }
        self.spawn_ai_actors(token, FIRST_WAVE).await;
        self.wolf_discussion(token).await;
        if !self.still_live(token).await {
            return;
        }

        // Wolves first; their result feeds the witch prompt. Only the wolves
        // forfeit at this ceiling; everyone else keeps their window.
        if !self
            .wait_night(token, &[RoleKind::Wolf], |game| {
                all_acted(game, RoleKind::Wolf)
            })
            .await
        {
            return;
        }
        {
            let mut game = self.room.game.lock().await;
            if game.dead_tonight.is_none() {
                game.dead_tonight = calculate_wolf_kill(&game);
                debug!(target = ?game.dead_tonight, "wolf kill computed");
            }
            self.prompt_human_actors(&game, &[RoleKind::Witch]);
        }
        self.spawn_ai_actors(token, &[RoleKind::Witch]).await;

        let everyone = |game: &Game| NIGHT_ROLES.iter().all(|kind| all_acted(game, *kind));
        if !self.wait_night(token, NIGHT_ROLES, everyone).await {
            return;
        }

        let deaths = {
            let mut game = self.room.game.lock().await;
            if game.phase != Some(Phase::Night) {
                return;
            }
            let outcome = resolve_night(&mut game);
            game.dead_tonight = None;
            game.touch();
            outcome.deaths
        };

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
        self.run_day(token, deaths).await;
    }

    /// ActionRequired prompts for connected humans whose role is in `kinds`.
    fn prompt_human_actors(&self, game: &Game, kinds: &[RoleKind]) {
        for seat in game.alive_seats().filter(|s| !s.is_ai && s.is_online) {
            let Some(kind) = seat.role_kind() else { continue };
            if !kinds.contains(&kind) || game.night_action(&seat.id).is_some() {
                continue;
            }
            let candidates = possible_targets(game, &seat.id);
            if kind.acts_at_night() {
                self.send_to(
                    &seat.id,
                    &ServerMsg::ActionRequired {
                        action: kind.as_str().to_string(),
                        candidates,
                        prompt: night_prompt(game, kind),
                    },
                );
            }
        }
    }

    /// One task per AI actor: ask the provider, fall back to a random legal
    /// choice, submit through the same path humans use.
    async fn spawn_ai_actors(&self, token: u64, kinds: &[RoleKind]) {
        let actors: Vec<PlayerId> = {
            let game = self.room.game.lock().await;
            game.alive_seats()
                .filter(|s| s.is_ai)
                .filter(|s| s.role_kind().is_some_and(|k| kinds.contains(&k) && k.acts_at_night()))
                .map(|s| s.id.clone())
                .collect()
        };
        for actor in actors {
            let flow = self.clone();
            tokio::spawn(async move {
                flow.ai_night_action(token, actor).await;
            });
        }
    }

    async fn ai_night_action(&self, token: u64, actor: PlayerId) {
        sleep(self.cfg.speech_lead_in).await;
        if !self.still_live(token).await {
            return;
        }
        let (view, candidates) = {
            let game = self.room.game.lock().await;
            if game.night_action(&actor).is_some() {
                return;
            }
            let Some(view) = PlayerView::for_seat(&game, &actor) else {
                return;
            };
            (view, masked_targets(&game, &actor))
        };

        let decision = match timeout(
            self.cfg.provider_timeout,
            self.provider.night_action(&view, &candidates),
        )
        .await
        {
            Ok(Ok(decision)) => decision,
            Ok(Err(e)) => {
                warn!(actor = %actor, error = %e, "provider night action failed, using fallback");
                match self.fallback.night_action(&view, &candidates).await {
                    Ok(decision) => decision,
                    Err(_) => return,
                }
            }
            Err(_) => {
                warn!(actor = %actor, "provider night action timed out, using fallback");
                match self.fallback.night_action(&view, &candidates).await {
                    Ok(decision) => decision,
                    Err(_) => return,
                }
            }
        };
        if !self.still_live(token).await {
            return;
        }

        let target = decision
            .target
            .as_deref()
            .and_then(|alias| view.unmask(alias).cloned());
        let action = NightAction {
            action: decision.action,
            target,
        };
        let mut game = self.room.game.lock().await;
        let result = crate::domain::roles::action_result(&game, &actor, &action);
        if result.as_ref().is_some_and(|r| r.success) || action.target.is_none() {
            game.record_night_action(actor.clone(), action);
        } else {
            // Illegal pick from the provider; record a pass so the night
            // never stalls on this seat.
            game.record_night_action(
                actor.clone(),
                NightAction {
                    action: crate::domain::state::NightActionKind::None,
                    target: None,
                },
            );
        }
    }

    /// Poll until `done` holds or the night ceiling passes. Seats holding one
    /// of `kinds` that never acted forfeit: a pass is recorded for them at the
    /// ceiling. Roles not yet prompted keep their window. Returns false when
    /// the run was superseded.
    async fn wait_night<F>(&self, token: u64, kinds: &[RoleKind], done: F) -> bool
    where
        F: Fn(&Game) -> bool,
    {
        let deadline = Instant::now() + self.cfg.night_ceiling;
        loop {
            if !self.still_live(token).await {
                return false;
            }
            {
                let game = self.room.game.lock().await;
                if done(&game) {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                let mut game = self.room.game.lock().await;
                let missing: Vec<PlayerId> = game
                    .alive_seats()
                    .filter(|s| s.role_kind().is_some_and(|kind| kinds.contains(&kind)))
                    .filter(|s| game.night_action(&s.id).is_none())
                    .map(|s| s.id.clone())
                    .collect();
                for id in missing {
                    debug!(actor = %id, "night ceiling reached, forfeiting action");
                    game.record_night_action(
                        id,
                        NightAction {
                            action: crate::domain::state::NightActionKind::None,
                            target: None,
                        },
                    );
                }
                return true;
            }
            sleep(self.cfg.night_poll).await;
        }
    }

    /// The wolves' private coordination window. With a human wolf alive the
    /// window is a fixed countdown with AI chatter in parallel; an all-AI
    /// pack just talks and moves on.
    async fn wolf_discussion(&self, token: u64) {
        let (human_wolf_online, wolves) = {
            let game = self.room.game.lock().await;
            let wolves = Self::wolf_ids(&game);
            let human = wolves
                .iter()
                .any(|id| game.seat(id).is_some_and(|s| !s.is_ai && s.is_online));
            (human, wolves)
        };
        if wolves.is_empty() {
            return;
        }

        if human_wolf_online {
            let chatter = {
                let flow = self.clone();
                tokio::spawn(async move {
                    flow.ai_wolf_chat(token).await;
                })
            };
            let mut remaining = self.cfg.wolf_discussion.as_secs();
            while remaining > 0 {
                if !self.still_live(token).await {
                    chatter.abort();
                    return;
                }
                {
                    let game = self.room.game.lock().await;
                    for id in &wolves {
                        self.send_to(
                            id,
                            &ServerMsg::Countdown {
                                seconds: remaining,
                                hide: false,
                            },
                        );
                    }
                    drop(game);
                }
                sleep(Duration::from_secs(1)).await;
                remaining -= 1;
            }
            for id in &wolves {
                self.send_to(
                    id,
                    &ServerMsg::Countdown {
                        seconds: 0,
                        hide: true,
                    },
                );
            }
            chatter.abort();
        } else {
            self.ai_wolf_chat(token).await;
        }
    }

    /// Two short rounds of AI wolf-channel chat, deduplicated.
    async fn ai_wolf_chat(&self, token: u64) {
        for _ in 0..2 {
            let speakers: Vec<PlayerId> = {
                let game = self.room.game.lock().await;
                Self::wolf_ids(&game)
                    .into_iter()
                    .filter(|id| game.seat(id).is_some_and(|s| s.is_ai))
                    .collect()
            };
            for speaker in speakers {
                sleep(self.cfg.speech_lead_in).await;
                if !self.still_live(token).await {
                    return;
                }
                let view = {
                    let game = self.room.game.lock().await;
                    PlayerView::for_seat(&game, &speaker)
                };
                let Some(view) = view else { continue };
                let line = match timeout(self.cfg.provider_timeout, self.provider.wolf_speak(&view))
                    .await
                {
                    Ok(Ok(line)) => line,
                    _ => self.fallback.wolf_speak(&view).await.ok().flatten(),
                };
                let Some(line) = line else { continue };

                let mut game = self.room.game.lock().await;
                if game.wolf_chat.iter().any(|m| m.content == line) {
                    continue;
                }
                let name = game
                    .seat(&speaker)
                    .map_or_else(|| speaker.clone(), |s| s.name.clone());
                game.add_wolf_message(name.clone(), line.clone());
                let time = game.wolf_chat.last().map_or(0, |m| m.time);
                let msg = ServerMsg::WolfChat {
                    from: name,
                    content: line,
                    time,
                };
                for id in Self::wolf_ids(&game) {
                    if game.seat(&id).is_some_and(|s| !s.is_ai && s.is_online) {
                        self.send_to(&id, &msg);
                    }
                }
            }
        }
    }

    /// Prompt or auto-play a pending hunter shot. Returns false when the
    /// run was superseded while waiting.
    pub(crate) async fn resolve_pending_hunter(&self, token: u64) -> bool {
        let (hunter, is_ai) = {
            let game = self.room.game.lock().await;
            match game.pending_hunter_shot.clone() {
                Some(id) => {
                    let is_ai = game.seat(&id).is_some_and(|s| s.is_ai);
                    (id, is_ai)
                }
                None => return true,
            }
        };

        if is_ai {
            let (view, candidates) = {
                let game = self.room.game.lock().await;
                let Some(view) = PlayerView::for_seat(&game, &hunter) else {
                    return true;
                };
                let candidates: Vec<String> = game
                    .alive_seats()
                    .filter_map(|s| game.pseudonyms.get(&s.id).cloned())
                    .collect();
                (view, candidates)
            };
            let pick = match timeout(
                self.cfg.provider_timeout,
                self.provider.hunter_shot(&view, &candidates),
            )
            .await
            {
                Ok(Ok(pick)) => pick,
                _ => self
                    .fallback
                    .hunter_shot(&view, &candidates)
                    .await
                    .ok()
                    .flatten(),
            };
            if !self.still_live(token).await {
                return false;
            }
            let target = pick.and_then(|alias| view.unmask(&alias).cloned());
            let mut game = self.room.game.lock().await;
            self.apply_hunter_shot(&mut game, &hunter, target.as_deref());
            return true;
        }

        {
            let game = self.room.game.lock().await;
            let candidates: Vec<TargetOption> = game
                .alive_seats()
                .map(|s| TargetOption {
                    id: s.id.clone(),
                    name: s.name.clone(),
                    action: None,
                    label: None,
                })
                .collect();
            self.send_to(
                &hunter,
                &ServerMsg::ActionRequired {
                    action: "hunter_shoot".to_string(),
                    candidates,
                    prompt: Some("You are dying. Take one player with you, or decline.".to_string()),
                },
            );
        }

        let deadline = Instant::now() + self.cfg.hunter_timeout;
        loop {
            if self.room.session() != token {
                return false;
            }
            {
                let game = self.room.game.lock().await;
                if game.pending_hunter_shot.is_none() {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                let mut game = self.room.game.lock().await;
                if game.pending_hunter_shot.as_deref() == Some(hunter.as_str()) {
                    self.apply_hunter_shot(&mut game, &hunter, None);
                }
                return true;
            }
            let _ = timeout(self.cfg.night_poll, self.room.shot_notify.notified()).await;
        }
    }

    /// Execute and announce a hunter shot (or its forfeit).
    pub(crate) fn apply_hunter_shot(&self, game: &mut Game, hunter: &str, target: Option<&str>) {
        let victim = match target {
            Some(t) => crate::domain::night::hunter_shoot(game, hunter, t),
            None => {
                game.pending_hunter_shot = None;
                None
            }
        };
        let hunter_name = game
            .seat(hunter)
            .map_or_else(|| hunter.to_string(), |s| s.name.clone());
        match &victim {
            Some(v) => {
                let victim_name = game
                    .seat(v)
                    .map_or_else(|| v.clone(), |s| s.name.clone());
                self.system_message(
                    game,
                    format!("{hunter_name} fires a final shot and takes {victim_name} down."),
                );
            }
            None => {
                self.system_message(game, format!("{hunter_name} lowers the gun."));
            }
        }
        self.broadcast(
            game,
            &ServerMsg::HunterShot {
                hunter: hunter.to_string(),
                victim,
            },
        );
    }
}

/// Every living seat of `kind` has submitted tonight.
fn all_acted(game: &Game, kind: RoleKind) -> bool {
    game.alive_with_role(kind)
        .all(|s| game.night_action(&s.id).is_some())
}

/// Legal targets with ids and names masked to the actor's aliases.
fn masked_targets(game: &Game, actor_id: &str) -> Vec<TargetOption> {
    possible_targets(game, actor_id)
        .into_iter()
        .filter_map(|t| {
            let alias = game.pseudonyms.get(&t.id)?.clone();
            Some(TargetOption {
                id: alias.clone(),
                name: alias,
                action: t.action,
                label: t.label,
            })
        })
        .collect()
}

fn night_prompt(game: &Game, kind: RoleKind) -> Option<String> {
    match kind {
        RoleKind::Witch => {
            let victim = game.dead_tonight.as_ref().and_then(|id| game.seat(id));
            Some(match victim {
                Some(seat) => format!(
                    "{} was attacked tonight. Use your antidote, your poison, or neither.",
                    seat.name
                ),
                None => "Nobody was attacked tonight. You may still use your poison.".to_string(),
            })
        }
        RoleKind::Wolf => Some("Choose tonight's victim with your pack.".to_string()),
        RoleKind::Seer => Some("Choose a player to check.".to_string()),
        RoleKind::Guard => Some("Choose a player to protect tonight.".to_string()),
        _ => None,
    }
}
