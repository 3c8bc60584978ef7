//! Shared fixtures for domain tests.

use crate::domain::roles::{Role, RoleKind};
use crate::domain::state::{Game, Lifecycle, NightAction, NightActionKind, Phase};

/// Build a playing game with the given roles dealt in seat order. Seat ids
/// are `u1`, `u2`, … and every seat is a human for simplicity.
pub fn game_with_roles(roles: &[RoleKind]) -> Game {
    let mut game = Game::new("room_test", "u1".to_string());
    for (i, kind) in roles.iter().enumerate() {
        let id = format!("u{}", i + 1);
        game.add_seat(id.clone(), format!("Player {}", i + 1), false);
        game.seat_mut(&id).unwrap().role = Some(Role::fresh(*kind));
    }
    game.lifecycle = Lifecycle::Playing;
    game.phase = Some(Phase::Night);
    game.day_number = 1;
    game.rebuild_pseudonyms();
    game
}

pub fn act(game: &mut Game, actor: &str, kind: NightActionKind, target: Option<&str>) {
    game.record_night_action(
        actor.to_string(),
        NightAction {
            action: kind,
            target: target.map(str::to_string),
        },
    );
}
