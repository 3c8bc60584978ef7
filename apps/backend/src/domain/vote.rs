//! Day vote tallying and elimination, including the idiot's reveal.

use crate::domain::night::kill_seat;
use crate::domain::roles::Role;
use crate::domain::state::{DeathCause, Game, PlayerId};

/// What the tally produced for broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteOutcome {
    /// Per-candidate counts for the result broadcast.
    pub counts: Vec<(PlayerId, u32)>,
    /// The eliminated seat, if the vote was decisive.
    pub eliminated: Option<PlayerId>,
    /// The vote landed on an idiot who revealed and survives.
    pub idiot_revealed: bool,
    /// No decisive plurality (tie or nobody voted).
    pub tied: bool,
}

/// Tally `game.votes` and apply the result. A strict plurality eliminates
/// its target; a tie or an empty tally eliminates nobody. An idiot voted
/// out reveals instead of dying: it survives but loses its vote.
pub fn resolve_vote(game: &mut Game) -> VoteOutcome {
    let mut counts: Vec<(PlayerId, u32)> = Vec::new();
    for target in game.votes.values() {
        match counts.iter_mut().find(|(t, _)| t == target) {
            Some((_, n)) => *n += 1,
            None => counts.push((target.clone(), 1)),
        }
    }

    let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let leaders: Vec<&PlayerId> = counts
        .iter()
        .filter(|(_, n)| *n == max)
        .map(|(t, _)| t)
        .collect();

    let mut outcome = VoteOutcome {
        counts: counts.clone(),
        eliminated: None,
        idiot_revealed: false,
        tied: leaders.len() != 1 || max == 0,
    };
    if outcome.tied {
        game.votes.clear();
        return outcome;
    }

    let target = leaders[0].clone();
    let is_unrevealed_idiot = matches!(
        game.seat(&target).and_then(|s| s.role.as_ref()),
        Some(Role::Idiot { can_reveal: true })
    );
    if is_unrevealed_idiot {
        if let Some(seat) = game.seat_mut(&target) {
            seat.can_vote = false;
            if let Some(Role::Idiot { can_reveal }) = seat.role.as_mut() {
                *can_reveal = false;
            }
        }
        outcome.idiot_revealed = true;
        outcome.eliminated = Some(target);
    } else {
        kill_seat(game, &target, DeathCause::Vote);
        outcome.eliminated = Some(target);
    }

    game.votes.clear();
    outcome
}
