use crate::domain::player_view::PlayerView;
use crate::domain::testkit::game_with_roles;
use crate::domain::RoleKind::{Seer, Villager, Witch, Wolf};

#[test]
fn aliases_are_a_stable_bijection() {
    let game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    let view = PlayerView::for_seat(&game, "u3").unwrap();
    assert_eq!(view.alias, "p3");
    for (i, seat) in view.seats.iter().enumerate() {
        assert_eq!(seat.alias, format!("p{}", i + 1));
    }
    assert_eq!(view.unmask("p1").map(String::as_str), Some("u1"));
    assert_eq!(view.unmask(" p5 ").map(String::as_str), Some("u5"));
    assert_eq!(view.unmask("p9"), None);
    assert_eq!(view.alias_of("u6"), Some("p6"));
}

#[test]
fn non_wolves_see_no_team_information() {
    let game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    let view = PlayerView::for_seat(&game, "u3").unwrap();
    assert!(view.seats.iter().all(|s| s.is_wolf.is_none()));
    assert!(view.transcript.is_empty());
}

#[test]
fn wolves_see_teammates_and_the_wolf_channel() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    game.add_message("Player 3", "I have a read on p1.");
    game.add_wolf_message("Player 2", "Take the seer tonight.");

    let view = PlayerView::for_seat(&game, "u1").unwrap();
    assert_eq!(view.seats[1].is_wolf, Some(true));
    assert_eq!(view.seats[2].is_wolf, Some(false));
    assert!(view
        .transcript
        .iter()
        .any(|m| m.from == "[wolf] p2" && m.content.contains("seer")));
    // Public speech is masked to aliases.
    assert!(view.transcript.iter().any(|m| m.from == "p3"));
}

#[test]
fn lobby_noise_is_filtered_and_transcript_is_trimmed() {
    let mut game = game_with_roles(&[Wolf, Wolf, Seer, Witch, Villager, Villager]);
    game.add_message("system", "Player 7 joined the room");
    game.add_message("system", "Player 7 left the room");
    for i in 0..40 {
        game.add_message("Player 5", format!("speech {i}"));
    }
    let view = PlayerView::for_seat(&game, "u3").unwrap();
    assert_eq!(view.transcript.len(), 25);
    assert!(view.transcript.iter().all(|m| m.from == "p5"));
    assert_eq!(view.transcript.last().unwrap().content, "speech 39");
}
