//! Night resolution: wolf kill tally, guard protection, witch potions, and
//! the resulting deaths with their triggers.

use crate::domain::roles::{Role, RoleKind};
use crate::domain::state::{Death, DeathCause, Game, NightActionKind, PlayerId};

/// Outcome of resolving one night.
#[derive(Debug, Clone, PartialEq)]
pub struct NightOutcome {
    /// Deaths in application order (wolf kill before poison).
    pub deaths: Vec<Death>,
    /// The computed kill was nullified by the guard or the antidote.
    pub saved: bool,
}

/// Tally wolf kill submissions. Tie-break is "first target to reach the
/// maximum count": iterating submissions in arrival order, a target only
/// replaces the leader with strictly more votes. This is observable by
/// players and must not change.
pub fn calculate_wolf_kill(game: &Game) -> Option<PlayerId> {
    let mut counts: Vec<(&PlayerId, u32)> = Vec::new();
    for (actor, action) in &game.night_actions {
        if game.seat(actor).and_then(|s| s.role_kind()) != Some(RoleKind::Wolf) {
            continue;
        }
        let Some(target) = &action.target else {
            continue;
        };
        if action.action != NightActionKind::Kill {
            continue;
        }
        match counts.iter_mut().find(|(t, _)| *t == target) {
            Some((_, n)) => *n += 1,
            None => counts.push((target, 1)),
        }
    }

    let mut max = 0u32;
    let mut leader = None;
    for (target, n) in counts {
        if n > max {
            max = n;
            leader = Some(target.clone());
        }
    }
    leader
}

/// Apply guard and witch effects to the computed kill, execute deaths, and
/// fire death triggers. The caller checks the win condition afterwards and
/// prompts any pending hunter shot.
pub fn resolve_night(game: &mut Game) -> NightOutcome {
    // The kill target is computed as soon as the wolf step completes so the
    // witch prompt can reference it; fall back for restored games.
    let mut killed = game.dead_tonight.clone().or_else(|| calculate_wolf_kill(game));
    let mut saved = false;
    let mut poisoned: Option<PlayerId> = None;

    // Guard: protecting the kill target nullifies it, unless the guard
    // repeated the previous night's choice. last_guarded tracks the latest
    // submission, so a skipped night clears the repeat restriction.
    let guard_submission = game
        .night_actions
        .iter()
        .find(|(id, _)| game.seat(id).and_then(|s| s.role_kind()) == Some(RoleKind::Guard))
        .map(|(_, a)| a.target.clone());
    if let Some(guard_target) = guard_submission {
        if let Some(guarded) = &guard_target {
            if Some(guarded) == killed.as_ref() && game.last_guarded.as_ref() != Some(guarded) {
                saved = true;
                killed = None;
            }
        }
        game.last_guarded = guard_target;
    }

    // Witch: antidote nullifies the kill (self-save only on night one),
    // poison marks an independent second death. Potions consume here.
    let witch_entry = game
        .night_actions
        .iter()
        .find(|(id, _)| game.seat(id).and_then(|s| s.role_kind()) == Some(RoleKind::Witch))
        .map(|(id, a)| (id.clone(), a.clone()));
    if let Some((witch_id, action)) = witch_entry {
        let self_save = killed.as_deref() == Some(witch_id.as_str());
        let can_self_save = game.day_number == 1;
        match action.action {
            NightActionKind::Save => {
                let has_antidote = matches!(
                    game.seat(&witch_id).and_then(|s| s.role.as_ref()),
                    Some(Role::Witch {
                        has_antidote: true,
                        ..
                    })
                );
                if killed.is_some() && has_antidote && (!self_save || can_self_save) {
                    if let Some(Role::Witch { has_antidote, .. }) =
                        game.seat_mut(&witch_id).and_then(|s| s.role.as_mut())
                    {
                        *has_antidote = false;
                    }
                    saved = true;
                    killed = None;
                }
            }
            NightActionKind::Poison => {
                let has_poison = matches!(
                    game.seat(&witch_id).and_then(|s| s.role.as_ref()),
                    Some(Role::Witch {
                        has_poison: true,
                        ..
                    })
                );
                if let (Some(target), true) = (action.target.clone(), has_poison) {
                    if let Some(Role::Witch { has_poison, .. }) =
                        game.seat_mut(&witch_id).and_then(|s| s.role.as_mut())
                    {
                        *has_poison = false;
                    }
                    poisoned = Some(target);
                }
            }
            _ => {}
        }
    }

    let mut deaths = Vec::new();
    if let Some(victim) = killed {
        kill_seat(game, &victim, DeathCause::Wolf);
        deaths.push(Death {
            id: victim,
            cause: DeathCause::Wolf,
        });
    }
    if let Some(victim) = poisoned {
        kill_seat(game, &victim, DeathCause::Poison);
        deaths.push(Death {
            id: victim,
            cause: DeathCause::Poison,
        });
    }

    NightOutcome { deaths, saved }
}

/// Clear a seat's alive flag and fire its death trigger. A hunter schedules
/// a follow-up shot unless the cause is poison, which disables it for good.
pub fn kill_seat(game: &mut Game, id: &str, cause: DeathCause) {
    let Some(seat) = game.seat_mut(id) else {
        return;
    };
    if !seat.is_alive {
        return;
    }
    seat.is_alive = false;

    let mut shot_pending = false;
    if let Some(Role::Hunter { can_shoot }) = seat.role.as_mut() {
        if cause == DeathCause::Poison {
            *can_shoot = false;
        } else if *can_shoot {
            shot_pending = true;
        }
    }
    if shot_pending {
        game.pending_hunter_shot = Some(id.to_string());
    }
}

/// A hunter's post-death shot: removes one living seat outside the normal
/// phase flow. Returns the victim if the shot landed.
pub fn hunter_shoot(game: &mut Game, hunter_id: &str, target_id: &str) -> Option<PlayerId> {
    if game.pending_hunter_shot.as_deref() != Some(hunter_id) {
        return None;
    }
    let landed = game.seat(target_id).is_some_and(|s| s.is_alive);
    if landed {
        kill_seat(game, target_id, DeathCause::Hunter);
    }
    game.pending_hunter_shot = None;
    landed.then(|| target_id.to_string())
}
