use crate::domain::roles::Role;
use crate::domain::snapshot::{restore, snapshot, GameSnapshot};
use crate::domain::state::{Lifecycle, NightActionKind, Phase};
use crate::domain::testkit::{act, game_with_roles};
use crate::domain::RoleKind::{Seer, Villager, Witch, Wolf};

#[test]
fn mid_night_state_survives_a_round_trip() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    game.day_number = 2;
    game.last_guarded = Some("u5".to_string());
    game.dead_tonight = Some("u6".to_string());
    act(&mut game, "u1", NightActionKind::Kill, Some("u6"));
    act(&mut game, "u3", NightActionKind::Check, Some("u2"));
    if let Some(Role::Witch { has_poison, .. }) = game.seat_mut("u4").unwrap().role.as_mut() {
        *has_poison = false;
    }
    game.add_message("system", "Night falls.");
    game.add_wolf_message("Player 1", "u6 tonight?");

    let json = serde_json::to_string(&snapshot(&game)).unwrap();
    let restored = restore(serde_json::from_str::<GameSnapshot>(&json).unwrap());

    assert_eq!(restored.day_number, 2);
    assert_eq!(restored.phase, Some(Phase::Night));
    assert_eq!(restored.last_guarded.as_deref(), Some("u5"));
    assert_eq!(restored.dead_tonight.as_deref(), Some("u6"));
    assert_eq!(restored.night_actions, game.night_actions);
    assert_eq!(
        restored.seat("u4").unwrap().role,
        Some(Role::Witch {
            has_antidote: true,
            has_poison: false
        })
    );
    assert_eq!(restored.wolf_chat.len(), 1);
    assert_eq!(restored.pseudonyms, game.pseudonyms);
}

#[test]
fn restored_playing_game_is_paused_with_humans_offline() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    game.seat_mut("u6").unwrap().is_ai = true;

    let restored = restore(snapshot(&game));
    assert!(restored.paused);
    assert!(restored.human_seats().all(|s| !s.is_online));
    assert!(restored.seat("u6").unwrap().is_online);
}

#[test]
fn waiting_room_restores_unpaused() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    game.lifecycle = Lifecycle::Waiting;
    game.phase = None;
    let restored = restore(snapshot(&game));
    assert!(!restored.paused);
}
