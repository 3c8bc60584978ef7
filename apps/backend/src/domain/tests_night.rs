use crate::domain::night::{calculate_wolf_kill, hunter_shoot, kill_seat, resolve_night};
use crate::domain::roles::{possible_targets, Role, RoleKind};
use crate::domain::state::{DeathCause, NightActionKind};
use crate::domain::testkit::{act, game_with_roles};

use RoleKind::{Guard, Hunter, Seer, Villager, Witch, Wolf};

#[test]
fn wolf_kill_majority_wins() {
    let mut game = game_with_roles(&[Wolf, Wolf, Wolf, Seer, Witch, Hunter, Villager, Villager]);
    act(&mut game, "u1", NightActionKind::Kill, Some("u7"));
    act(&mut game, "u2", NightActionKind::Kill, Some("u4"));
    act(&mut game, "u3", NightActionKind::Kill, Some("u7"));
    assert_eq!(calculate_wolf_kill(&game), Some("u7".to_string()));
}

#[test]
fn wolf_kill_tie_keeps_first_to_reach_max() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    act(&mut game, "u1", NightActionKind::Kill, Some("u5"));
    act(&mut game, "u2", NightActionKind::Kill, Some("u6"));
    // u5 reached one vote first; u6 never exceeds it.
    assert_eq!(calculate_wolf_kill(&game), Some("u5".to_string()));
}

#[test]
fn wolf_kill_ignores_non_wolf_submissions() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    act(&mut game, "u3", NightActionKind::Kill, Some("u1"));
    assert_eq!(calculate_wolf_kill(&game), None);
}

#[test]
fn guard_nullifies_the_kill() {
    let mut game = game_with_roles(&[
        Wolf, Wolf, Wolf, Seer, Witch, Hunter, Guard, Villager, Villager, Villager,
    ]);
    act(&mut game, "u1", NightActionKind::Kill, Some("u8"));
    act(&mut game, "u7", NightActionKind::Guard, Some("u8"));
    let outcome = resolve_night(&mut game);
    assert!(outcome.saved);
    assert!(outcome.deaths.is_empty());
    assert!(game.seat("u8").unwrap().is_alive);
    assert_eq!(game.last_guarded.as_deref(), Some("u8"));
}

#[test]
fn guard_skip_clears_the_repeat_restriction() {
    let mut game = game_with_roles(&[
        Wolf, Wolf, Wolf, Seer, Witch, Hunter, Guard, Villager, Villager, Villager,
    ]);
    game.last_guarded = Some("u8".to_string());
    act(&mut game, "u7", NightActionKind::None, None);
    resolve_night(&mut game);
    assert_eq!(game.last_guarded, None);

    // Guarding u8 again the following night is legal and protective.
    game.night_actions.clear();
    act(&mut game, "u1", NightActionKind::Kill, Some("u8"));
    act(&mut game, "u7", NightActionKind::Guard, Some("u8"));
    let outcome = resolve_night(&mut game);
    assert!(outcome.saved);
    assert!(game.seat("u8").unwrap().is_alive);
}

#[test]
fn night_target_options_carry_the_roles_action() {
    let game = game_with_roles(&[
        Wolf, Wolf, Wolf, Seer, Witch, Hunter, Guard, Villager, Villager, Villager,
    ]);
    for (actor, kind) in [
        ("u1", NightActionKind::Kill),
        ("u4", NightActionKind::Check),
        ("u7", NightActionKind::Guard),
    ] {
        let targets = possible_targets(&game, actor);
        assert!(!targets.is_empty());
        assert!(targets.iter().all(|t| t.action == Some(kind)));
    }
}

#[test]
fn repeated_guard_does_not_protect() {
    let mut game = game_with_roles(&[
        Wolf, Wolf, Wolf, Seer, Witch, Hunter, Guard, Villager, Villager, Villager,
    ]);
    game.last_guarded = Some("u8".to_string());
    act(&mut game, "u1", NightActionKind::Kill, Some("u8"));
    act(&mut game, "u7", NightActionKind::Guard, Some("u8"));
    let outcome = resolve_night(&mut game);
    assert!(!outcome.saved);
    assert_eq!(outcome.deaths.len(), 1);
    assert!(!game.seat("u8").unwrap().is_alive);
}

#[test]
fn witch_save_consumes_antidote() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    act(&mut game, "u1", NightActionKind::Kill, Some("u5"));
    act(&mut game, "u4", NightActionKind::Save, None);
    let outcome = resolve_night(&mut game);
    assert!(outcome.saved);
    assert!(game.seat("u5").unwrap().is_alive);
    assert_eq!(
        game.seat("u4").unwrap().role,
        Some(Role::Witch {
            has_antidote: false,
            has_poison: true
        })
    );
}

#[test]
fn witch_self_save_allowed_only_on_first_night() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    act(&mut game, "u1", NightActionKind::Kill, Some("u4"));
    act(&mut game, "u4", NightActionKind::Save, None);
    let outcome = resolve_night(&mut game);
    assert!(outcome.saved, "night one self-save is legal");

    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    game.day_number = 2;
    act(&mut game, "u1", NightActionKind::Kill, Some("u4"));
    act(&mut game, "u4", NightActionKind::Save, None);
    let outcome = resolve_night(&mut game);
    assert!(!outcome.saved);
    assert!(!game.seat("u4").unwrap().is_alive);
    // The failed save still holds the antidote.
    assert_eq!(
        game.seat("u4").unwrap().role,
        Some(Role::Witch {
            has_antidote: true,
            has_poison: true
        })
    );
}

#[test]
fn poison_is_independent_of_the_kill() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    act(&mut game, "u1", NightActionKind::Kill, Some("u5"));
    act(&mut game, "u4", NightActionKind::Poison, Some("u1"));
    let outcome = resolve_night(&mut game);
    let ids: Vec<&str> = outcome.deaths.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["u5", "u1"]);
    assert_eq!(outcome.deaths[1].cause, DeathCause::Poison);
    assert_eq!(
        game.seat("u4").unwrap().role,
        Some(Role::Witch {
            has_antidote: true,
            has_poison: false
        })
    );
}

#[test]
fn quiet_night_when_witch_saves_everyone() {
    // Eight seats, wolves converge, witch saves: nobody dies.
    let mut game = game_with_roles(&[Wolf, Wolf, Wolf, Seer, Witch, Hunter, Villager, Villager]);
    act(&mut game, "u1", NightActionKind::Kill, Some("u6"));
    act(&mut game, "u2", NightActionKind::Kill, Some("u6"));
    act(&mut game, "u3", NightActionKind::Kill, Some("u6"));
    act(&mut game, "u4", NightActionKind::Check, Some("u1"));
    act(&mut game, "u5", NightActionKind::Save, None);
    let outcome = resolve_night(&mut game);
    assert!(outcome.deaths.is_empty());
    assert_eq!(game.alive_seats().count(), 8);
}

#[test]
fn hunter_killed_by_wolves_gets_a_shot() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Hunter, Villager, Villager]);
    act(&mut game, "u1", NightActionKind::Kill, Some("u4"));
    resolve_night(&mut game);
    assert_eq!(game.pending_hunter_shot.as_deref(), Some("u4"));

    let victim = hunter_shoot(&mut game, "u4", "u1");
    assert_eq!(victim.as_deref(), Some("u1"));
    assert!(!game.seat("u1").unwrap().is_alive);
    assert!(game.pending_hunter_shot.is_none());
}

#[test]
fn poisoned_hunter_cannot_shoot() {
    let mut game = game_with_roles(&[Wolf, Wolf, Witch, Hunter, Villager, Villager]);
    act(&mut game, "u3", NightActionKind::Poison, Some("u4"));
    resolve_night(&mut game);
    assert!(game.pending_hunter_shot.is_none());
    assert_eq!(
        game.seat("u4").unwrap().role,
        Some(Role::Hunter { can_shoot: false })
    );
}

#[test]
fn hunter_shot_at_a_corpse_misses() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Hunter, Villager, Villager]);
    kill_seat(&mut game, "u5", DeathCause::Vote);
    kill_seat(&mut game, "u4", DeathCause::Wolf);
    assert_eq!(game.pending_hunter_shot.as_deref(), Some("u4"));
    assert_eq!(hunter_shoot(&mut game, "u4", "u5"), None);
    assert!(game.pending_hunter_shot.is_none());
}
