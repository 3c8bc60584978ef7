//! Pure game rules. No async, no I/O; the services layer drives these
//! functions and owns all timing.

pub mod night;
pub mod player_view;
pub mod roles;
pub mod rules;
pub mod snapshot;
pub mod state;
pub mod vote;

#[cfg(test)]
pub(crate) mod testkit;

#[cfg(test)]
mod tests_night;
#[cfg(test)]
mod tests_rules;
#[cfg(test)]
mod tests_snapshot;
#[cfg(test)]
mod tests_view;
#[cfg(test)]
mod tests_vote;

pub use night::{calculate_wolf_kill, hunter_shoot, kill_seat, resolve_night, NightOutcome};
pub use player_view::PlayerView;
pub use roles::{action_result, possible_targets, ActionResult, Role, RoleKind, TargetOption, Team};
pub use rules::{assign_roles, check_game_end, role_table, MAX_PLAYERS, MIN_PLAYERS};
pub use snapshot::{restore, snapshot, GameSnapshot};
pub use state::{
    ChatEntry, Death, DeathCause, EndResult, Game, Lifecycle, NightAction, NightActionKind, Phase,
    PlayerId, Seat, Winner,
};
pub use vote::{resolve_vote, VoteOutcome};
