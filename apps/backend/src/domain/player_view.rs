//! Masked game view handed to decision providers.
//!
//! Seats are renamed to stable aliases (`p1`..`pN` in join order) so a
//! provider never sees real ids or lobby names. The alias map is a
//! bijection; [`PlayerView::unmask`] maps a returned alias back to the
//! real id.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::roles::{Role, RoleKind, Team};
use crate::domain::state::{ChatEntry, Game, Phase, PlayerId};

/// Transcript entries a provider should see. Lobby traffic carries no
/// signal and only burns prompt budget.
const TRANSCRIPT_LIMIT: usize = 25;

#[derive(Debug, Clone, Serialize)]
pub struct ViewSeat {
    pub alias: String,
    pub is_alive: bool,
    /// Only populated for wolf teammates in a wolf's view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_wolf: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewMessage {
    pub from: String,
    pub content: String,
    #[serde(skip)]
    pub time: i64,
}

/// Everything a provider may know when deciding for one seat.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub alias: String,
    pub role: RoleKind,
    pub day_number: u32,
    pub phase: Option<Phase>,
    pub seats: Vec<ViewSeat>,
    pub transcript: Vec<ViewMessage>,
    #[serde(skip)]
    aliases: HashMap<String, PlayerId>,
}

impl PlayerView {
    /// Build the masked view for `viewer_id`. Returns `None` for a seat
    /// without a dealt role.
    pub fn for_seat(game: &Game, viewer_id: &str) -> Option<PlayerView> {
        let viewer = game.seat(viewer_id)?;
        let role = viewer.role_kind()?;
        let is_wolf = viewer.role.as_ref().map(Role::team) == Some(Team::Wolf);

        let mut aliases = HashMap::new();
        let mut seats = Vec::with_capacity(game.seat_count());
        for (index, seat) in game.seats.iter().enumerate() {
            let alias = format!("p{}", index + 1);
            aliases.insert(alias.clone(), seat.id.clone());
            seats.push(ViewSeat {
                alias,
                is_alive: seat.is_alive,
                is_wolf: if is_wolf {
                    Some(seat.role.as_ref().map(Role::team) == Some(Team::Wolf))
                } else {
                    None
                },
            });
        }
        let alias_of: HashMap<&PlayerId, &String> = game
            .seats
            .iter()
            .zip(seats.iter())
            .map(|(seat, view)| (&seat.id, &view.alias))
            .collect();
        // Chat entries carry display names; map those through the seat list.
        let mask = |from: &str| -> String {
            game.seats
                .iter()
                .find(|s| s.name == from || s.id == from)
                .and_then(|s| alias_of.get(&s.id))
                .map_or_else(|| from.to_string(), |a| (*a).clone())
        };

        let mut transcript: Vec<ViewMessage> = game
            .messages
            .iter()
            .filter(|m| is_game_chat(m))
            .map(|m| ViewMessage {
                from: mask(&m.from),
                content: m.content.clone(),
                time: m.time,
            })
            .collect();
        if is_wolf {
            transcript.extend(game.wolf_chat.iter().map(|m| ViewMessage {
                from: format!("[wolf] {}", mask(&m.from)),
                content: m.content.clone(),
                time: m.time,
            }));
            transcript.sort_by_key(|m| m.time);
        }
        if transcript.len() > TRANSCRIPT_LIMIT {
            transcript.drain(..transcript.len() - TRANSCRIPT_LIMIT);
        }

        Some(PlayerView {
            alias: alias_of
                .get(&viewer.id)
                .map_or_else(String::new, |a| (*a).clone()),
            role,
            day_number: game.day_number,
            phase: game.phase,
            seats,
            transcript,
            aliases,
        })
    }

    /// Map a provider-returned alias back to the real seat id.
    pub fn unmask(&self, alias: &str) -> Option<&PlayerId> {
        self.aliases.get(alias.trim())
    }

    /// Alias for a real seat id, for prompt building.
    pub fn alias_of(&self, id: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(_, real)| real.as_str() == id)
            .map(|(alias, _)| alias.as_str())
    }
}

/// Lobby and system noise stays out of the provider transcript.
fn is_game_chat(entry: &ChatEntry) -> bool {
    if entry.from == "system" {
        let c = entry.content.as_str();
        return !(c.contains("joined the room")
            || c.contains("left the room")
            || c.contains("created the room"));
    }
    true
}
