//! Role distribution and win conditions.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::roles::{Role, RoleKind, Team};
use crate::domain::state::{EndResult, Game, Winner};
use crate::errors::domain::{ConflictKind, DomainError};

pub const MIN_PLAYERS: usize = 6;
pub const MAX_PLAYERS: usize = 12;

/// Role list for a given seat count. Guard enters at ten seats, the fourth
/// wolf at twelve.
pub fn role_table(seat_count: usize) -> Result<Vec<RoleKind>, DomainError> {
    use RoleKind::{Guard, Hunter, Idiot, Seer, Villager, Witch, Wolf};
    let roles: &[RoleKind] = match seat_count {
        6 => &[Wolf, Wolf, Seer, Witch, Villager, Villager],
        7 => &[Wolf, Wolf, Seer, Witch, Hunter, Villager, Villager],
        8 => &[Wolf, Wolf, Wolf, Seer, Witch, Hunter, Villager, Villager],
        9 => &[
            Wolf, Wolf, Wolf, Seer, Witch, Hunter, Villager, Villager, Villager,
        ],
        10 => &[
            Wolf, Wolf, Wolf, Seer, Witch, Hunter, Guard, Villager, Villager, Villager,
        ],
        11 => &[
            Wolf, Wolf, Wolf, Seer, Witch, Hunter, Guard, Idiot, Villager, Villager, Villager,
        ],
        12 => &[
            Wolf, Wolf, Wolf, Wolf, Seer, Witch, Hunter, Guard, Idiot, Villager, Villager,
            Villager,
        ],
        n => {
            return Err(DomainError::conflict(
                ConflictKind::UnsupportedSeatCount,
                format!("no role distribution for {n} seats"),
            ))
        }
    };
    Ok(roles.to_vec())
}

/// Shuffle the role list for the current seat count and deal it out in seat
/// order. Seeded so tests can pin a deal.
pub fn assign_roles(game: &mut Game, seed: u64) -> Result<(), DomainError> {
    let mut roles = role_table(game.seat_count())?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    roles.shuffle(&mut rng);
    for (seat, kind) in game.seats.iter_mut().zip(roles) {
        seat.role = Some(Role::fresh(kind));
    }
    Ok(())
}

/// Check the win condition over living seats. Villagers win when no wolf
/// remains. Wolves win when either full side (gods or plain villagers) is
/// wiped out, or when they reach numeric parity with everyone else.
pub fn check_game_end(game: &Game) -> Option<EndResult> {
    let mut wolves = 0usize;
    let mut gods = 0usize;
    let mut villagers = 0usize;
    for seat in game.alive_seats() {
        match seat.role.as_ref().map(Role::team) {
            Some(Team::Wolf) => wolves += 1,
            Some(Team::God) => gods += 1,
            Some(Team::Villager) => villagers += 1,
            None => {}
        }
    }

    if wolves == 0 {
        return Some(EndResult {
            winner: Winner::Villager,
            reason: "All werewolves are dead. The village wins.".to_string(),
        });
    }
    if gods == 0 || villagers == 0 {
        return Some(EndResult {
            winner: Winner::Wolf,
            reason: "One side of the village has been wiped out. The werewolves win.".to_string(),
        });
    }
    if wolves >= gods + villagers {
        return Some(EndResult {
            winner: Winner::Wolf,
            reason: "The werewolves have reached parity. The werewolves win.".to_string(),
        });
    }
    None
}
