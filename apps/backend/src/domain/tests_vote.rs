use crate::domain::roles::{Role, RoleKind};
use crate::domain::testkit::game_with_roles;
use crate::domain::vote::resolve_vote;

use RoleKind::{Idiot, Seer, Villager, Witch, Wolf};

fn cast(game: &mut crate::domain::state::Game, voter: &str, target: &str) {
    game.votes.insert(voter.to_string(), target.to_string());
}

#[test]
fn plurality_eliminates_its_target() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    cast(&mut game, "u1", "u5");
    cast(&mut game, "u2", "u5");
    cast(&mut game, "u3", "u1");
    let outcome = resolve_vote(&mut game);
    assert_eq!(outcome.eliminated.as_deref(), Some("u5"));
    assert!(!outcome.tied);
    assert!(!game.seat("u5").unwrap().is_alive);
    assert!(game.votes.is_empty());
}

#[test]
fn tie_eliminates_nobody() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    cast(&mut game, "u1", "u5");
    cast(&mut game, "u2", "u6");
    let outcome = resolve_vote(&mut game);
    assert!(outcome.tied);
    assert!(outcome.eliminated.is_none());
    assert_eq!(game.alive_seats().count(), 6);
}

#[test]
fn empty_tally_is_a_tie() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    let outcome = resolve_vote(&mut game);
    assert!(outcome.tied);
    assert!(outcome.eliminated.is_none());
}

#[test]
fn voted_out_idiot_reveals_and_survives() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Idiot, Villager, Villager]);
    cast(&mut game, "u1", "u4");
    cast(&mut game, "u2", "u4");
    let outcome = resolve_vote(&mut game);
    assert!(outcome.idiot_revealed);
    assert_eq!(outcome.eliminated.as_deref(), Some("u4"));

    let idiot = game.seat("u4").unwrap();
    assert!(idiot.is_alive);
    assert!(!idiot.can_vote);
    assert_eq!(idiot.role, Some(Role::Idiot { can_reveal: false }));
    assert!(
        !game.eligible_voters().any(|s| s.id == "u4"),
        "a revealed idiot is out of later tallies"
    );
}

#[test]
fn revealed_idiot_dies_to_a_second_vote() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Idiot, Villager, Villager]);
    if let Some(Role::Idiot { can_reveal }) = game.seat_mut("u4").unwrap().role.as_mut() {
        *can_reveal = false;
    }
    cast(&mut game, "u1", "u4");
    cast(&mut game, "u2", "u4");
    let outcome = resolve_vote(&mut game);
    assert!(!outcome.idiot_revealed);
    assert!(!game.seat("u4").unwrap().is_alive);
}
