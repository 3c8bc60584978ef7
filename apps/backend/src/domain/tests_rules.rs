use std::collections::HashMap;

use crate::domain::night::kill_seat;
use crate::domain::roles::{RoleKind, Team};
use crate::domain::rules::{assign_roles, check_game_end, role_table, MAX_PLAYERS, MIN_PLAYERS};
use crate::domain::state::{DeathCause, Game, Winner};
use crate::domain::testkit::game_with_roles;

use RoleKind::{Seer, Villager, Witch, Wolf};

#[test]
fn every_supported_count_has_a_table() {
    for n in MIN_PLAYERS..=MAX_PLAYERS {
        let roles = role_table(n).unwrap();
        assert_eq!(roles.len(), n);
        let wolves = roles.iter().filter(|r| r.team() == Team::Wolf).count();
        assert!(wolves >= 2, "{n} seats deal at least two wolves");
        assert!(roles.contains(&Seer));
        assert!(roles.contains(&Witch));
    }
    assert!(role_table(5).is_err());
    assert!(role_table(13).is_err());
}

#[test]
fn assignment_deals_the_table_exactly() {
    let mut game = Game::new("room_test", "u1".to_string());
    for i in 1..=9 {
        game.add_seat(format!("u{i}"), format!("Player {i}"), false);
    }
    assign_roles(&mut game, 42).unwrap();

    let mut dealt: HashMap<RoleKind, usize> = HashMap::new();
    for seat in &game.seats {
        *dealt.entry(seat.role_kind().unwrap()).or_default() += 1;
    }
    let mut expected: HashMap<RoleKind, usize> = HashMap::new();
    for kind in role_table(9).unwrap() {
        *expected.entry(kind).or_default() += 1;
    }
    assert_eq!(dealt, expected);
}

#[test]
fn same_seed_same_deal() {
    let mut a = Game::new("room_a", "u1".to_string());
    let mut b = Game::new("room_b", "u1".to_string());
    for i in 1..=8 {
        a.add_seat(format!("u{i}"), format!("Player {i}"), false);
        b.add_seat(format!("u{i}"), format!("Player {i}"), false);
    }
    assign_roles(&mut a, 7).unwrap();
    assign_roles(&mut b, 7).unwrap();
    let deal = |g: &Game| -> Vec<RoleKind> { g.seats.iter().filter_map(|s| s.role_kind()).collect() };
    assert_eq!(deal(&a), deal(&b));
}

#[test]
fn villagers_win_when_wolves_are_gone() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    assert!(check_game_end(&game).is_none());
    kill_seat(&mut game, "u1", DeathCause::Vote);
    kill_seat(&mut game, "u2", DeathCause::Vote);
    let end = check_game_end(&game).unwrap();
    assert_eq!(end.winner, Winner::Villager);
}

#[test]
fn wolves_win_when_gods_are_wiped_out() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    kill_seat(&mut game, "u3", DeathCause::Wolf);
    kill_seat(&mut game, "u4", DeathCause::Poison);
    let end = check_game_end(&game).unwrap();
    assert_eq!(end.winner, Winner::Wolf);
}

#[test]
fn wolves_win_when_plain_villagers_are_wiped_out() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    kill_seat(&mut game, "u5", DeathCause::Wolf);
    kill_seat(&mut game, "u6", DeathCause::Wolf);
    let end = check_game_end(&game).unwrap();
    assert_eq!(end.winner, Winner::Wolf);
}

#[test]
fn wolves_win_at_parity() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    kill_seat(&mut game, "u3", DeathCause::Wolf);
    kill_seat(&mut game, "u5", DeathCause::Wolf);
    // Two wolves against a witch and a villager.
    let end = check_game_end(&game).unwrap();
    assert_eq!(end.winner, Winner::Wolf);
    assert!(end.reason.contains("parity"));
}
