//! Random decision provider: uniform choices over legal options, canned
//! speech. The fallback when no LLM is configured and the safety net when
//! one times out.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::prelude::*;

use super::trait_def::{AiError, DecisionProvider, NightDecision, VoteDecision};
use crate::domain::player_view::PlayerView;
use crate::domain::roles::TargetOption;
use crate::domain::state::NightActionKind;

const SPEECH_LINES: &[&str] = &[
    "I don't have much to go on yet. I'll listen for now.",
    "Nothing last night points anywhere obvious to me.",
    "Someone is being very quiet. That is worth watching.",
    "I'm a villager, for what it's worth.",
    "I'd rather we vote on evidence than on gut feeling.",
    "Let's hear from the people who haven't spoken.",
];

const WOLF_LINES: &[&str] = &[
    "Let's spread our votes tomorrow so it looks natural.",
    "The loud one is probably a god role. Worth taking out.",
    "I'll claim villager if pressed.",
];

/// Uniformly random legal decisions.
///
/// Thread-safe via `Mutex<StdRng>`; seedable for deterministic tests.
pub struct RandomProvider {
    rng: Mutex<StdRng>,
}

impl RandomProvider {
    pub const NAME: &'static str = "RandomProvider";
    pub const VERSION: &'static str = "1.0.0";

    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StdRng>, AiError> {
        self.rng
            .lock()
            .map_err(|e| AiError::Internal(format!("RNG lock poisoned: {e}")))
    }
}

#[async_trait]
impl DecisionProvider for RandomProvider {
    async fn night_action(
        &self,
        _view: &PlayerView,
        candidates: &[TargetOption],
    ) -> Result<NightDecision, AiError> {
        let mut rng = self.lock()?;
        let Some(pick) = candidates.choose(&mut *rng) else {
            return Ok(NightDecision {
                action: NightActionKind::None,
                target: None,
                reason: None,
            });
        };
        Ok(NightDecision {
            action: pick.action.unwrap_or(NightActionKind::None),
            target: Some(pick.id.clone()),
            reason: None,
        })
    }

    async fn vote(
        &self,
        _view: &PlayerView,
        candidates: &[String],
    ) -> Result<VoteDecision, AiError> {
        let mut rng = self.lock()?;
        Ok(VoteDecision {
            target: candidates.choose(&mut *rng).cloned(),
            reason: None,
        })
    }

    async fn hunter_shot(
        &self,
        _view: &PlayerView,
        candidates: &[String],
    ) -> Result<Option<String>, AiError> {
        let mut rng = self.lock()?;
        Ok(candidates.choose(&mut *rng).cloned())
    }

    async fn speak(&self, _view: &PlayerView) -> Result<Vec<String>, AiError> {
        let mut rng = self.lock()?;
        let count = rng.random_range(1..=2);
        let mut lines: Vec<String> = Vec::with_capacity(count);
        while lines.len() < count {
            if let Some(line) = SPEECH_LINES.choose(&mut *rng) {
                let line = (*line).to_string();
                if !lines.contains(&line) {
                    lines.push(line);
                }
            }
        }
        Ok(lines)
    }

    async fn wolf_speak(&self, _view: &PlayerView) -> Result<Option<String>, AiError> {
        let mut rng = self.lock()?;
        Ok(WOLF_LINES.choose(&mut *rng).map(|l| (*l).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::RandomProvider;
    use crate::ai::trait_def::DecisionProvider;
    use crate::domain::player_view::PlayerView;
    use crate::domain::night::calculate_wolf_kill;
    use crate::domain::roles::{possible_targets, TargetOption};
    use crate::domain::state::{NightAction, NightActionKind};
    use crate::domain::testkit::game_with_roles;
    use crate::domain::RoleKind::{Seer, Villager, Witch, Wolf};

    fn view() -> PlayerView {
        let game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
        PlayerView::for_seat(&game, "u1").unwrap()
    }

    #[tokio::test]
    async fn picks_only_from_the_candidates() {
        let provider = RandomProvider::new(Some(7));
        let candidates = vec![TargetOption {
            id: "p3".to_string(),
            name: "p3".to_string(),
            action: Some(NightActionKind::Kill),
            label: None,
        }];
        let decision = provider.night_action(&view(), &candidates).await.unwrap();
        assert_eq!(decision.action, NightActionKind::Kill);
        assert_eq!(decision.target.as_deref(), Some("p3"));
    }

    #[tokio::test]
    async fn wolf_decision_from_its_own_targets_lands_in_the_kill_tally() {
        let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
        let provider = RandomProvider::new(Some(5));
        let view = PlayerView::for_seat(&game, "u1").unwrap();
        let candidates = possible_targets(&game, "u1");
        let decision = provider.night_action(&view, &candidates).await.unwrap();
        assert_eq!(decision.action, NightActionKind::Kill);
        let target = decision.target.clone().unwrap();
        assert!(game.record_night_action(
            "u1".to_string(),
            NightAction {
                action: decision.action,
                target: Some(target.clone()),
            },
        ));
        assert_eq!(calculate_wolf_kill(&game), Some(target));
    }

    #[tokio::test]
    async fn empty_candidates_mean_no_action() {
        let provider = RandomProvider::new(Some(7));
        let decision = provider.night_action(&view(), &[]).await.unwrap();
        assert_eq!(decision.action, NightActionKind::None);
        assert!(decision.target.is_none());

        let vote = provider.vote(&view(), &[]).await.unwrap();
        assert!(vote.target.is_none());
    }

    #[tokio::test]
    async fn same_seed_same_votes() {
        let candidates: Vec<String> = (1..=5).map(|i| format!("p{i}")).collect();
        let a = RandomProvider::new(Some(99));
        let b = RandomProvider::new(Some(99));
        for _ in 0..10 {
            let va = a.vote(&view(), &candidates).await.unwrap();
            let vb = b.vote(&view(), &candidates).await.unwrap();
            assert_eq!(va.target, vb.target);
        }
    }

    #[tokio::test]
    async fn speech_is_one_to_two_distinct_lines() {
        let provider = RandomProvider::new(Some(3));
        for _ in 0..20 {
            let lines = provider.speak(&view()).await.unwrap();
            assert!((1..=2).contains(&lines.len()));
            if lines.len() == 2 {
                assert_ne!(lines[0], lines[1]);
            }
        }
    }
}
