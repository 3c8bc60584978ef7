//! Orchestration tests. All run on a paused tokio clock with the fast
//! config, so sleeps and ceilings resolve in virtual time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::GameFlow;
use crate::ai::{AiError, DecisionProvider, NightDecision, RandomProvider, VoteDecision};
use crate::config::game::GameConfig;
use crate::domain::night::kill_seat;
use crate::domain::player_view::PlayerView;
use crate::domain::roles::TargetOption;
use crate::domain::state::{DeathCause, Game, Lifecycle, Phase};
use crate::domain::testkit::game_with_roles;
use crate::domain::RoleKind::{Hunter, Seer, Villager, Witch, Wolf};
use crate::protocol::ServerMsg;
use crate::services::game_room::GameRoom;
use crate::services::outbound::RecordingOutbound;

fn flow_with(
    game: Game,
    provider: Arc<dyn DecisionProvider>,
) -> (GameFlow, Arc<RecordingOutbound>) {
    let outbound = RecordingOutbound::new();
    let flow = GameFlow::new(
        GameRoom::new(game),
        outbound.clone(),
        provider,
        Arc::new(GameConfig::fast()),
    );
    (flow, outbound)
}

fn flow_for(game: Game) -> (GameFlow, Arc<RecordingOutbound>) {
    flow_with(game, Arc::new(RandomProvider::new(Some(11))))
}

/// A provider whose upstream is down. Every decision must come from the
/// random fallback instead.
struct FailingProvider;

#[async_trait]
impl DecisionProvider for FailingProvider {
    async fn night_action(
        &self,
        _view: &PlayerView,
        _candidates: &[TargetOption],
    ) -> Result<NightDecision, AiError> {
        Err(AiError::Internal("provider offline".to_string()))
    }

    async fn vote(
        &self,
        _view: &PlayerView,
        _candidates: &[String],
    ) -> Result<VoteDecision, AiError> {
        Err(AiError::Internal("provider offline".to_string()))
    }

    async fn hunter_shot(
        &self,
        _view: &PlayerView,
        _candidates: &[String],
    ) -> Result<Option<String>, AiError> {
        Err(AiError::Internal("provider offline".to_string()))
    }

    async fn speak(&self, _view: &PlayerView) -> Result<Vec<String>, AiError> {
        Err(AiError::Internal("provider offline".to_string()))
    }

    async fn wolf_speak(&self, _view: &PlayerView) -> Result<Option<String>, AiError> {
        Err(AiError::Internal("provider offline".to_string()))
    }
}

fn all_ai(mut game: Game) -> Game {
    for seat in &mut game.seats {
        seat.is_ai = true;
    }
    game
}

async fn wait_until<F>(flow: &GameFlow, mut pred: F)
where
    F: FnMut(&Game) -> bool,
{
    for _ in 0..10_000 {
        {
            let game = flow.room.game.lock().await;
            if pred(&game) {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never held");
}

#[tokio::test(start_paused = true)]
async fn all_ai_game_runs_to_completion() {
    let mut game = all_ai(game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]));
    game.lifecycle = Lifecycle::Playing;
    game.phase = None;
    game.day_number = 0;
    let (flow, _) = flow_for(game);

    flow.spawn_night();
    wait_until(&flow, |g| g.lifecycle == Lifecycle::Ended).await;

    let game = flow.room.game.lock().await;
    let end = game.end_result.as_ref().expect("game must produce a result");
    assert!(!end.reason.is_empty());
}

#[tokio::test(start_paused = true)]
async fn provider_failure_falls_back_to_random_decisions() {
    let mut game = all_ai(game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]));
    game.lifecycle = Lifecycle::Playing;
    game.phase = None;
    game.day_number = 0;
    let (flow, _) = flow_with(game, Arc::new(FailingProvider));

    flow.spawn_night();
    wait_until(&flow, |g| g.lifecycle == Lifecycle::Ended).await;

    let game = flow.room.game.lock().await;
    assert!(game.end_result.is_some());
}

#[tokio::test(start_paused = true)]
async fn stalled_wolves_forfeit_without_costing_the_witch_her_window() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    // Human wolves who never act, a human witch, AI everywhere else.
    for seat in &mut game.seats {
        seat.is_ai = !matches!(seat.id.as_str(), "u1" | "u2" | "u4");
    }
    game.phase = None;
    game.day_number = 0;
    let (flow, outbound) = flow_for(game);
    flow.spawn_night();

    // The wolves stall past the ceiling and forfeit.
    wait_until(&flow, |g| g.night_action("u1").is_some()).await;

    // The witch is only prompted now, with her window intact.
    let mut prompted = false;
    for _ in 0..1_000 {
        if outbound
            .to("u4")
            .iter()
            .any(|m| matches!(m, ServerMsg::ActionRequired { action, .. } if action == "witch"))
        {
            prompted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(prompted, "witch never received her prompt");

    flow.handle_action("u4", "poison", Some("u1".to_string()), None)
        .await
        .unwrap();
    wait_until(&flow, |g| g.seat("u1").is_some_and(|s| !s.is_alive)).await;
}

#[tokio::test(start_paused = true)]
async fn superseded_token_stops_being_live() {
    let game = all_ai(game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]));
    let (flow, _) = flow_for(game);
    let token = flow.room.begin_run();
    assert!(flow.still_live(token).await);

    flow.room.begin_run();
    assert!(!flow.still_live(token).await);
}

#[tokio::test(start_paused = true)]
async fn pause_halts_the_run_and_resume_restarts_it() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    game.seats.iter_mut().skip(1).for_each(|s| s.is_ai = true);
    let (flow, outbound) = flow_for(game);
    let token = flow.room.begin_run();

    flow.pause("u1").await.unwrap();
    assert!(!flow.still_live(token).await);
    assert!(outbound
        .to("u1")
        .iter()
        .any(|m| matches!(m, ServerMsg::GamePaused)));

    // Pause is host-only.
    let err = flow.pause("u2").await;
    assert!(err.is_err());

    flow.resume("u1").await.unwrap();
    {
        let game = flow.room.game.lock().await;
        assert!(!game.paused);
    }
    wait_until(&flow, |g| g.lifecycle == Lifecycle::Ended || g.day_number > 0).await;
}

#[tokio::test(start_paused = true)]
async fn vote_resolves_early_once_everyone_voted() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    game.phase = Some(Phase::Day);
    let (flow, outbound) = flow_for(game);
    let token = flow.room.begin_run();

    let vote_task = {
        let flow = flow.clone();
        tokio::spawn(async move {
            flow.run_vote(token).await;
        })
    };
    wait_until(&flow, |g| g.phase == Some(Phase::Vote)).await;

    for voter in ["u1", "u2", "u3", "u4", "u5", "u6"] {
        flow.handle_action(voter, "vote", Some("u5".to_string()), None)
            .await
            .unwrap();
    }
    wait_until(&flow, |g| g.seat("u5").is_some_and(|s| !s.is_alive)).await;
    vote_task.abort();

    // The hidden zero countdown marks the early resolution.
    assert!(outbound.to("u1").iter().any(
        |m| matches!(m, ServerMsg::Countdown { seconds: 0, hide: true })
    ));
    assert!(outbound
        .to("u1")
        .iter()
        .any(|m| matches!(m, ServerMsg::VoteResult { eliminated: Some(e), .. } if e == "u5")));
}

#[tokio::test(start_paused = true)]
async fn late_vote_after_resolution_is_rejected() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    game.phase = Some(Phase::Day);
    let (flow, _) = flow_for(game);
    let token = flow.room.begin_run();

    let vote_task = {
        let flow = flow.clone();
        tokio::spawn(async move {
            flow.run_vote(token).await;
        })
    };
    wait_until(&flow, |g| g.phase == Some(Phase::Vote)).await;
    for voter in ["u1", "u2", "u3", "u4", "u5", "u6"] {
        flow.handle_action(voter, "vote", Some("u5".to_string()), None)
            .await
            .unwrap();
    }
    wait_until(&flow, |g| g.phase != Some(Phase::Vote)).await;
    vote_task.abort();

    let err = flow
        .handle_action("u1", "vote", Some("u2".to_string()), None)
        .await;
    assert!(err.is_err(), "voting is closed after resolution");
}

#[tokio::test(start_paused = true)]
async fn human_hunter_shot_is_prompted_and_applied() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Hunter, Villager, Villager]);
    kill_seat(&mut game, "u4", DeathCause::Wolf);
    assert_eq!(game.pending_hunter_shot.as_deref(), Some("u4"));
    let (flow, outbound) = flow_for(game);
    let token = flow.room.begin_run();

    let waiter = {
        let flow = flow.clone();
        tokio::spawn(async move { flow.resolve_pending_hunter(token).await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(outbound.to("u4").iter().any(
        |m| matches!(m, ServerMsg::ActionRequired { action, .. } if action == "hunter_shoot")
    ));

    flow.handle_action("u4", "hunter_shoot", Some("u1".to_string()), None)
        .await
        .unwrap();
    assert!(waiter.await.unwrap());

    let game = flow.room.game.lock().await;
    assert!(!game.seat("u1").unwrap().is_alive);
    assert!(game.pending_hunter_shot.is_none());
}

#[tokio::test(start_paused = true)]
async fn unprompted_hunter_shot_is_rejected() {
    let game = game_with_roles(&[Wolf, Wolf, Seer, Hunter, Villager, Villager]);
    let (flow, _) = flow_for(game);
    let err = flow
        .handle_action("u4", "hunter_shoot", Some("u1".to_string()), None)
        .await;
    assert!(err.is_err());
}

#[tokio::test(start_paused = true)]
async fn dead_players_cannot_chat() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    kill_seat(&mut game, "u5", DeathCause::Vote);
    let (flow, _) = flow_for(game);

    let err = flow.handle_chat("u5", "boo".to_string(), false).await;
    assert!(err.is_err());
    let game = flow.room.game.lock().await;
    assert!(game.messages.iter().all(|m| m.content != "boo"));
}

#[tokio::test(start_paused = true)]
async fn wolf_night_chat_routes_to_the_wolf_channel() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    game.phase = Some(Phase::Night);
    let (flow, outbound) = flow_for(game);

    flow.handle_chat("u1", "the seer dies tonight".to_string(), false)
        .await
        .unwrap();

    let game = flow.room.game.lock().await;
    assert_eq!(game.wolf_chat.len(), 1);
    assert!(game.messages.iter().all(|m| m.from != "Player 1"));
    // Only the wolves hear it.
    assert!(outbound
        .to("u2")
        .iter()
        .any(|m| matches!(m, ServerMsg::WolfChat { .. })));
    assert!(outbound
        .to("u3")
        .iter()
        .all(|m| !matches!(m, ServerMsg::WolfChat { .. })));
}

#[tokio::test(start_paused = true)]
async fn night_submissions_validate_role_and_phase() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    game.phase = Some(Phase::Night);
    let (flow, outbound) = flow_for(game);

    // A villager has no night action.
    assert!(flow
        .handle_action("u5", "kill", Some("u3".to_string()), None)
        .await
        .is_err());

    // The seer's check comes back privately.
    flow.handle_action("u3", "check", Some("u1".to_string()), None)
        .await
        .unwrap();
    assert!(outbound.to("u3").iter().any(|m| matches!(
        m,
        ServerMsg::ActionResult {
            success: true,
            is_wolf: Some(true),
            ..
        }
    )));

    // Acting twice is rejected.
    assert!(flow
        .handle_action("u3", "check", Some("u2".to_string()), None)
        .await
        .is_err());
}

#[tokio::test(start_paused = true)]
async fn end_speech_advances_past_the_current_speaker() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    game.phase = Some(Phase::Night);
    game.current_speaker = Some("u2".to_string());
    let (flow, _) = flow_for(game);

    assert!(flow.handle_action("u1", "end_speech", None, None).await.is_err());
    flow.handle_action("u2", "end_speech", None, None).await.unwrap();
    let game = flow.room.game.lock().await;
    assert!(game.current_speaker.is_none());
}
