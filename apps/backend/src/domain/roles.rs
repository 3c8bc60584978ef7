//! Role capability set: closed enum over the seven roles, each carrying its
//! own consumable state. Lethal and saving effects are applied only during
//! phase resolution so guard, wolf, and witch actions can interact before
//! anyone dies.

use serde::{Deserialize, Serialize};

use crate::domain::state::{Game, NightAction, NightActionKind, PlayerId};

/// Coarse win-condition grouping. Fixed at assignment, never changes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Wolf,
    God,
    Villager,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Wolf,
    Seer,
    Witch,
    Hunter,
    Guard,
    Idiot,
    Villager,
}

impl RoleKind {
    pub fn team(self) -> Team {
        match self {
            RoleKind::Wolf => Team::Wolf,
            RoleKind::Seer | RoleKind::Witch | RoleKind::Hunter | RoleKind::Guard
            | RoleKind::Idiot => Team::God,
            RoleKind::Villager => Team::Villager,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoleKind::Wolf => "wolf",
            RoleKind::Seer => "seer",
            RoleKind::Witch => "witch",
            RoleKind::Hunter => "hunter",
            RoleKind::Guard => "guard",
            RoleKind::Idiot => "idiot",
            RoleKind::Villager => "villager",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RoleKind::Wolf => "Each night, choose a victim together with your pack.",
            RoleKind::Seer => "Each night, learn whether one player is a wolf.",
            RoleKind::Witch => {
                "One antidote to save the night's victim, one poison to kill. Each once."
            }
            RoleKind::Hunter => "When killed (except by poison), shoot one player.",
            RoleKind::Guard => {
                "Each night, protect one player from the wolves. Never the same player twice in a row."
            }
            RoleKind::Idiot => {
                "If voted out, reveal your card to survive, but lose your vote forever."
            }
            RoleKind::Villager => "No special ability. Find the wolves and vote them out.",
        }
    }

    /// Roles whose night action the orchestrator waits for.
    pub fn acts_at_night(self) -> bool {
        matches!(
            self,
            RoleKind::Wolf | RoleKind::Seer | RoleKind::Witch | RoleKind::Guard
        )
    }
}

/// One seat's role together with its private consumable state. Serializes as
/// a tagged object so snapshots carry exactly the counters that survive a
/// restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    Wolf,
    Seer,
    Witch { has_antidote: bool, has_poison: bool },
    Hunter { can_shoot: bool },
    Guard,
    Idiot { can_reveal: bool },
    Villager,
}

impl Role {
    /// Fresh role instance as dealt at game start.
    pub fn fresh(kind: RoleKind) -> Self {
        match kind {
            RoleKind::Wolf => Role::Wolf,
            RoleKind::Seer => Role::Seer,
            RoleKind::Witch => Role::Witch {
                has_antidote: true,
                has_poison: true,
            },
            RoleKind::Hunter => Role::Hunter { can_shoot: true },
            RoleKind::Guard => Role::Guard,
            RoleKind::Idiot => Role::Idiot { can_reveal: true },
            RoleKind::Villager => Role::Villager,
        }
    }

    pub fn kind(&self) -> RoleKind {
        match self {
            Role::Wolf => RoleKind::Wolf,
            Role::Seer => RoleKind::Seer,
            Role::Witch { .. } => RoleKind::Witch,
            Role::Hunter { .. } => RoleKind::Hunter,
            Role::Guard => RoleKind::Guard,
            Role::Idiot { .. } => RoleKind::Idiot,
            Role::Villager => RoleKind::Villager,
        }
    }

    pub fn team(&self) -> Team {
        self.kind().team()
    }
}

/// One selectable target in an action prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetOption {
    pub id: PlayerId,
    pub name: String,
    /// Action tag when a role offers more than one (witch: save / poison).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<NightActionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Private result payload sent back to the actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    /// Seer check verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_wolf: Option<bool>,
}

/// Compute the targets a seat may pick tonight. Pure; restrictions come from
/// the role and current game state (alive seats, last guard target, computed
/// kill target for the witch).
pub fn possible_targets(game: &Game, actor_id: &str) -> Vec<TargetOption> {
    let Some(actor) = game.seat(actor_id) else {
        return Vec::new();
    };
    let Some(role) = &actor.role else {
        return Vec::new();
    };

    match role {
        Role::Wolf => game
            .alive_seats()
            .filter(|s| s.role_kind() != Some(RoleKind::Wolf))
            .map(|s| TargetOption {
                id: s.id.clone(),
                name: s.name.clone(),
                action: Some(NightActionKind::Kill),
                label: None,
            })
            .collect(),

        Role::Seer => game
            .alive_seats()
            .filter(|s| s.id != actor_id)
            .map(|s| TargetOption {
                id: s.id.clone(),
                name: s.name.clone(),
                action: Some(NightActionKind::Check),
                label: None,
            })
            .collect(),

        Role::Guard => game
            .alive_seats()
            .filter(|s| game.last_guarded.as_deref() != Some(s.id.as_str()))
            .map(|s| TargetOption {
                id: s.id.clone(),
                name: s.name.clone(),
                action: Some(NightActionKind::Guard),
                label: None,
            })
            .collect(),

        Role::Witch {
            has_antidote,
            has_poison,
        } => {
            let mut targets = Vec::new();
            if *has_antidote {
                if let Some(victim) = &game.dead_tonight {
                    let self_save = victim == actor_id;
                    // Self-save is only allowed on night one.
                    if !self_save || game.day_number == 1 {
                        targets.push(TargetOption {
                            id: victim.clone(),
                            name: "tonight's victim".to_string(),
                            action: Some(NightActionKind::Save),
                            label: Some("use the antidote".to_string()),
                        });
                    }
                }
            }
            if *has_poison {
                targets.extend(
                    game.alive_seats()
                        .filter(|s| s.id != actor_id)
                        .map(|s| TargetOption {
                            id: s.id.clone(),
                            name: s.name.clone(),
                            action: Some(NightActionKind::Poison),
                            label: Some(format!("poison {}", s.name)),
                        }),
                );
            }
            targets
        }

        // Hunter, idiot, and villager have no night action.
        Role::Hunter { .. } | Role::Idiot { .. } | Role::Villager => Vec::new(),
    }
}

/// Validate a night action against the actor's consumable state and produce
/// the private result payload. Does not mutate survival; effects apply during
/// night resolution.
pub fn action_result(game: &Game, actor_id: &str, action: &NightAction) -> Option<ActionResult> {
    let actor = game.seat(actor_id)?;
    let role = actor.role.as_ref()?;
    let target_name = |id: &Option<PlayerId>| {
        id.as_deref()
            .and_then(|t| game.seat(t))
            .map(|s| s.name.clone())
    };

    match (role, action.action) {
        (Role::Wolf, NightActionKind::Kill) => {
            let name = target_name(&action.target)?;
            Some(ActionResult {
                success: true,
                message: format!("You chose to kill {name}."),
                is_wolf: None,
            })
        }
        (Role::Wolf, NightActionKind::None) => Some(ActionResult {
            success: true,
            message: "You chose not to act.".to_string(),
            is_wolf: None,
        }),

        (Role::Seer, NightActionKind::Check) => {
            let target = game.seat(action.target.as_deref()?)?;
            let is_wolf = target.role_kind() == Some(RoleKind::Wolf);
            Some(ActionResult {
                success: true,
                message: format!(
                    "{} is {}.",
                    target.name,
                    if is_wolf { "a wolf" } else { "a good person" }
                ),
                is_wolf: Some(is_wolf),
            })
        }

        (Role::Witch { has_antidote, .. }, NightActionKind::Save) => {
            if !*has_antidote {
                return None;
            }
            let self_save = game.dead_tonight.as_deref() == Some(actor_id);
            if self_save && game.day_number > 1 {
                return Some(ActionResult {
                    success: false,
                    message: "You cannot save yourself after the first night.".to_string(),
                    is_wolf: None,
                });
            }
            Some(ActionResult {
                success: true,
                message: "You used the antidote.".to_string(),
                is_wolf: None,
            })
        }
        (Role::Witch { has_poison, .. }, NightActionKind::Poison) => {
            if !*has_poison {
                return None;
            }
            let name = target_name(&action.target)?;
            Some(ActionResult {
                success: true,
                message: format!("You chose to poison {name}."),
                is_wolf: None,
            })
        }
        (Role::Witch { .. }, NightActionKind::None) => Some(ActionResult {
            success: true,
            message: "You kept both potions.".to_string(),
            is_wolf: None,
        }),

        (Role::Guard, NightActionKind::Guard) => {
            let name = target_name(&action.target)?;
            Some(ActionResult {
                success: true,
                message: format!("You are guarding {name}."),
                is_wolf: None,
            })
        }
        (Role::Guard, NightActionKind::None) => Some(ActionResult {
            success: true,
            message: "You guarded no one.".to_string(),
            is_wolf: None,
        }),

        _ => None,
    }
}
