//! Room registry: lobby operations, message dispatch, reconnect, cleanup,
//! and autosave. One instance lives in app state for the whole process.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ai::DecisionProvider;
use crate::config::game::GameConfig;
use crate::domain::roles::{possible_targets, Role, Team};
use crate::domain::rules::{assign_roles, MAX_PLAYERS, MIN_PLAYERS};
use crate::domain::snapshot::{restore, snapshot};
use crate::domain::state::{now_millis, EndResult, Game, Lifecycle, Phase, PlayerId, Winner};
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::protocol::messages::SpeakingTurn;
use crate::protocol::{ClientMsg, RoomSummary, SeatInfo, ServerMsg};
use crate::services::game_flow::{seat_infos, GameFlow};
use crate::services::game_room::GameRoom;
use crate::services::outbound::Outbound;
use crate::storage::SnapshotStore;

const AI_NAME_POOL: &[&str] = &[
    "Avery", "Blake", "Casey", "Drew", "Ellis", "Finley", "Harper", "Jordan", "Kendall", "Logan",
    "Morgan", "Quinn",
];

struct PlayerEntry {
    name: String,
    room_id: Option<String>,
}

pub struct RoomRegistry {
    rooms: DashMap<String, GameFlow>,
    players: DashMap<PlayerId, PlayerEntry>,
    outbound: Arc<dyn Outbound>,
    provider: Arc<dyn DecisionProvider>,
    store: Arc<dyn SnapshotStore>,
    cfg: Arc<GameConfig>,
}

impl RoomRegistry {
    pub fn new(
        outbound: Arc<dyn Outbound>,
        provider: Arc<dyn DecisionProvider>,
        store: Arc<dyn SnapshotStore>,
        cfg: Arc<GameConfig>,
    ) -> Arc<Self> {
        Arc::new(Self {
            rooms: DashMap::new(),
            players: DashMap::new(),
            outbound,
            provider,
            store,
            cfg,
        })
    }

    /// Restore saved rooms at boot. Restored games come back paused; their
    /// hosts resume them once reconnected.
    pub async fn load_saved_rooms(&self) -> Result<usize, AppError> {
        let snapshots = self.store.load_all()?;
        let count = snapshots.len();
        for snap in snapshots {
            let game = restore(snap);
            let room_id = game.room_id.clone();
            for seat in game.human_seats() {
                self.players.insert(
                    seat.id.clone(),
                    PlayerEntry {
                        name: seat.name.clone(),
                        room_id: Some(room_id.clone()),
                    },
                );
            }
            let flow = self.make_flow(game);
            self.rooms.insert(room_id, flow);
        }
        if count > 0 {
            info!(count, "restored rooms from snapshot store");
        }
        Ok(count)
    }

    fn make_flow(&self, game: Game) -> GameFlow {
        GameFlow::new(
            GameRoom::new(game),
            Arc::clone(&self.outbound),
            Arc::clone(&self.provider),
            Arc::clone(&self.cfg),
        )
    }

    fn flow(&self, room_id: &str) -> Result<GameFlow, AppError> {
        self.rooms
            .get(room_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Room, format!("room {room_id} is gone")).into()
            })
    }

    fn room_of(&self, user_id: &str) -> Result<GameFlow, AppError> {
        let room_id = self
            .players
            .get(user_id)
            .and_then(|p| p.room_id.clone())
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Room, "you are not in a room")
            })?;
        self.flow(&room_id)
    }

    /// Single dispatch point for everything a socket sends after `join`.
    pub async fn handle(&self, user_id: &str, msg: ClientMsg) -> Result<(), AppError> {
        match msg {
            ClientMsg::Join { .. } => Ok(()), // handled at connection setup
            ClientMsg::CreateRoom => self.create_room(user_id).await,
            ClientMsg::JoinRoom { room_id } => self.join_room(user_id, &room_id).await,
            ClientMsg::LeaveRoom => self.leave_room(user_id).await,
            ClientMsg::AddAi => self.add_ai(user_id).await,
            ClientMsg::RemoveAi => self.remove_ai(user_id).await,
            ClientMsg::StartGame => self.start_game(user_id).await,
            ClientMsg::GameAction {
                action,
                target,
                reason,
            } => {
                self.room_of(user_id)?
                    .handle_action(user_id, &action, target, reason)
                    .await
            }
            ClientMsg::Chat {
                message,
                is_wolf_chat,
            } => {
                self.room_of(user_id)?
                    .handle_chat(user_id, message, is_wolf_chat)
                    .await
            }
            ClientMsg::GetRooms => self.send_room_list(user_id).await,
            ClientMsg::PauseGame => self.room_of(user_id)?.pause(user_id).await,
            ClientMsg::ResumeGame => self.room_of(user_id)?.resume(user_id).await,
            ClientMsg::ExitGame => self.exit_game(user_id).await,
        }
    }

    /// First message on a socket. Reconnecting players get their room state
    /// back.
    pub async fn register(&self, user_id: &str, name: &str) -> Result<(), AppError> {
        let previous_room = self
            .players
            .get(user_id)
            .and_then(|p| p.room_id.clone());
        self.players.insert(
            user_id.to_string(),
            PlayerEntry {
                name: name.to_string(),
                room_id: previous_room.clone(),
            },
        );
        self.outbound.send(
            user_id,
            &ServerMsg::Joined {
                user_id: user_id.to_string(),
            },
        );

        if let Some(room_id) = previous_room {
            match self.flow(&room_id) {
                Ok(flow) => {
                    let mut game = flow.room.game.lock().await;
                    if let Some(seat) = game.seat_mut(user_id) {
                        seat.is_online = true;
                        game.touch();
                        info!(user_id, room_id = %game.room_id, "player reconnected");
                        self.outbound
                            .send(user_id, &room_state_for(&game, user_id));
                    }
                }
                Err(_) => {
                    if let Some(mut entry) = self.players.get_mut(user_id) {
                        entry.room_id = None;
                    }
                }
            }
        }
        Ok(())
    }

    /// Socket dropped without an exit. The seat goes offline; cleanup or a
    /// reconnect decides the rest.
    pub async fn disconnect(&self, user_id: &str) {
        let Ok(flow) = self.room_of(user_id) else {
            return;
        };
        let mut game = flow.room.game.lock().await;
        match game.lifecycle {
            Lifecycle::Waiting => {
                drop(game);
                let _ = self.leave_room(user_id).await;
            }
            _ => {
                if let Some(seat) = game.seat_mut(user_id) {
                    seat.is_online = false;
                }
                debug!(user_id, room_id = %game.room_id, "player went offline");
                let name = game
                    .seat(user_id)
                    .map_or_else(|| user_id.to_string(), |s| s.name.clone());
                flow.system_message(&mut game, format!("{name} lost connection."));
            }
        }
    }

    async fn create_room(&self, user_id: &str) -> Result<(), AppError> {
        let mut entry = self.players.get_mut(user_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Other("player".to_string()), "join first")
        })?;
        if entry.room_id.is_some() {
            return Err(DomainError::conflict(
                ConflictKind::AlreadyInRoom,
                "leave your current room first",
            )
            .into());
        }
        let room_id = format!("room_{}", &Uuid::new_v4().simple().to_string()[..8]);
        let mut game = Game::new(room_id.clone(), user_id.to_string());
        game.add_seat(user_id.to_string(), entry.name.clone(), false);
        game.add_message("system", format!("{} created the room", entry.name));
        entry.room_id = Some(room_id.clone());
        drop(entry);

        info!(user_id, room_id = %room_id, "room created");
        let flow = self.make_flow(game);
        {
            let game = flow.room.game.lock().await;
            self.outbound
                .send(user_id, &room_state_for(&game, user_id));
        }
        self.rooms.insert(room_id, flow);
        Ok(())
    }

    async fn join_room(&self, user_id: &str, room_id: &str) -> Result<(), AppError> {
        let flow = self.flow(room_id)?;
        let name = {
            let mut entry = self.players.get_mut(user_id).ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Other("player".to_string()), "join first")
            })?;
            if entry.room_id.is_some() {
                return Err(DomainError::conflict(
                    ConflictKind::AlreadyInRoom,
                    "leave your current room first",
                )
                .into());
            }
            entry.room_id = Some(room_id.to_string());
            entry.name.clone()
        };

        let mut game = flow.room.game.lock().await;
        if game.lifecycle != Lifecycle::Waiting {
            self.clear_membership(user_id);
            return Err(DomainError::conflict(
                ConflictKind::GameAlreadyStarted,
                "that game is already running",
            )
            .into());
        }
        if game.seat_count() >= MAX_PLAYERS {
            self.clear_membership(user_id);
            return Err(
                DomainError::conflict(ConflictKind::RoomFull, "that room is full").into(),
            );
        }
        game.add_seat(user_id.to_string(), name.clone(), false);
        game.touch();
        info!(user_id, room_id, "player joined room");
        flow.system_message(&mut game, format!("{name} joined the room"));
        self.sync_room_state(&game);
        Ok(())
    }

    async fn leave_room(&self, user_id: &str) -> Result<(), AppError> {
        let flow = self.room_of(user_id)?;
        let mut game = flow.room.game.lock().await;
        if game.lifecycle == Lifecycle::Playing {
            return Err(DomainError::conflict(
                ConflictKind::GameAlreadyStarted,
                "use exit_game while a game is running",
            )
            .into());
        }
        let room_id = game.room_id.clone();
        if game.host_id == user_id {
            // Host leaving dissolves the room.
            info!(user_id, room_id = %room_id, "host left, closing room");
            for seat in game.human_seats() {
                self.clear_membership(&seat.id);
                self.outbound.send(
                    &seat.id,
                    &ServerMsg::RoomClosed {
                        reason: "The host left the room.".to_string(),
                    },
                );
            }
            drop(game);
            self.rooms.remove(&room_id);
            return Ok(());
        }

        let name = game
            .seat(user_id)
            .map_or_else(|| user_id.to_string(), |s| s.name.clone());
        game.remove_seat(user_id);
        game.touch();
        self.clear_membership(user_id);
        self.outbound.send(user_id, &ServerMsg::LeftRoom);
        flow.system_message(&mut game, format!("{name} left the room"));
        self.sync_room_state(&game);
        Ok(())
    }

    async fn add_ai(&self, user_id: &str) -> Result<(), AppError> {
        let flow = self.room_of(user_id)?;
        let mut game = flow.room.game.lock().await;
        require_waiting_host(&game, user_id)?;
        if game.seat_count() >= MAX_PLAYERS {
            return Err(
                DomainError::conflict(ConflictKind::RoomFull, "the room is full").into(),
            );
        }
        let name = AI_NAME_POOL
            .iter()
            .find(|n| game.seats.iter().all(|s| s.name != **n))
            .copied()
            .unwrap_or("Robin")
            .to_string();
        let id = format!("ai_{}", &Uuid::new_v4().simple().to_string()[..8]);
        game.add_seat(id, name.clone(), true);
        game.touch();
        debug!(room_id = %game.room_id, name = %name, "AI seat added");
        flow.system_message(&mut game, format!("{name} (AI) joined the room"));
        self.sync_room_state(&game);
        Ok(())
    }

    async fn remove_ai(&self, user_id: &str) -> Result<(), AppError> {
        let flow = self.room_of(user_id)?;
        let mut game = flow.room.game.lock().await;
        require_waiting_host(&game, user_id)?;
        let Some(last_ai) = game.seats.iter().rev().find(|s| s.is_ai).map(|s| s.id.clone())
        else {
            return Err(DomainError::not_found(
                NotFoundKind::Seat,
                "there is no AI seat to remove",
            )
            .into());
        };
        let name = game
            .seat(&last_ai)
            .map_or_else(String::new, |s| s.name.clone());
        game.remove_seat(&last_ai);
        game.touch();
        flow.system_message(&mut game, format!("{name} (AI) left the room"));
        self.sync_room_state(&game);
        Ok(())
    }

    async fn start_game(&self, user_id: &str) -> Result<(), AppError> {
        let flow = self.room_of(user_id)?;
        {
            let mut game = flow.room.game.lock().await;
            require_waiting_host(&game, user_id)?;
            if game.seat_count() < MIN_PLAYERS {
                return Err(DomainError::conflict(
                    ConflictKind::UnsupportedSeatCount,
                    format!("need at least {MIN_PLAYERS} players"),
                )
                .into());
            }
            assign_roles(&mut game, rand::random())?;
            game.lifecycle = Lifecycle::Playing;
            game.day_number = 0;
            game.rebuild_pseudonyms();
            game.touch();
            info!(room_id = %game.room_id, players = game.seat_count(), "game started");

            let wolves: Vec<PlayerId> = game
                .seats
                .iter()
                .filter(|s| s.role.as_ref().map(Role::team) == Some(Team::Wolf))
                .map(|s| s.id.clone())
                .collect();
            for seat in game.human_seats().filter(|s| s.is_online) {
                let Some(role) = seat.role.clone() else { continue };
                let teammates = if role.team() == Team::Wolf {
                    wolves.iter().filter(|id| **id != seat.id).cloned().collect()
                } else {
                    Vec::new()
                };
                self.outbound.send(
                    &seat.id,
                    &ServerMsg::GameStarted {
                        description: role.kind().description().to_string(),
                        role,
                        teammates,
                    },
                );
            }
            self.sync_room_state(&game);
        }
        flow.spawn_night();
        self.autosave().await;
        Ok(())
    }

    /// Leave a running game. The host exiting closes the room for everyone;
    /// the last human exiting abandons the game.
    async fn exit_game(&self, user_id: &str) -> Result<(), AppError> {
        let flow = self.room_of(user_id)?;
        let mut game = flow.room.game.lock().await;
        let room_id = game.room_id.clone();
        if game.host_id == user_id {
            info!(user_id, room_id = %room_id, "host exited, closing room");
            flow.room.invalidate();
            for seat in game.human_seats() {
                self.clear_membership(&seat.id);
                self.outbound.send(
                    &seat.id,
                    &ServerMsg::RoomClosed {
                        reason: "The host ended the game.".to_string(),
                    },
                );
            }
            drop(game);
            self.rooms.remove(&room_id);
            return Ok(());
        }

        let name = game
            .seat(user_id)
            .map_or_else(|| user_id.to_string(), |s| s.name.clone());
        if let Some(seat) = game.seat_mut(user_id) {
            seat.is_online = false;
        }
        self.clear_membership(user_id);
        self.outbound.send(user_id, &ServerMsg::ExitedGame);
        self.broadcast_room(&game, |_| ServerMsg::PlayerExited {
            user_id: user_id.to_string(),
            name: name.clone(),
        });
        flow.system_message(&mut game, format!("{name} left the game."));

        if game.lifecycle == Lifecycle::Playing && game.human_seats().all(|s| !s.is_online) {
            flow.finish(
                &mut game,
                EndResult {
                    winner: Winner::None,
                    reason: "All human players left the game.".to_string(),
                },
            );
        }
        drop(game);
        self.autosave().await;
        Ok(())
    }

    /// Clone the flows out so no map guard is held across an await.
    fn all_flows(&self) -> Vec<GameFlow> {
        self.rooms.iter().map(|e| e.value().clone()).collect()
    }

    async fn send_room_list(&self, user_id: &str) -> Result<(), AppError> {
        let mut rooms = Vec::new();
        for flow in self.all_flows() {
            let game = flow.room.game.lock().await;
            rooms.push(RoomSummary {
                room_id: game.room_id.clone(),
                host_name: game
                    .seat(&game.host_id)
                    .map_or_else(String::new, |s| s.name.clone()),
                player_count: game.seat_count(),
                lifecycle: game.lifecycle,
            });
        }
        self.outbound.send(user_id, &ServerMsg::RoomList { rooms });
        Ok(())
    }

    /// Push each member their own view of the room.
    fn sync_room_state(&self, game: &Game) {
        for seat in game.human_seats().filter(|s| s.is_online) {
            self.outbound.send(&seat.id, &room_state_for(game, &seat.id));
        }
    }

    fn broadcast_room<F>(&self, game: &Game, msg: F)
    where
        F: Fn(&str) -> ServerMsg,
    {
        for seat in game.human_seats().filter(|s| s.is_online) {
            self.outbound.send(&seat.id, &msg(&seat.id));
        }
    }

    fn clear_membership(&self, user_id: &str) {
        if let Some(mut entry) = self.players.get_mut(user_id) {
            entry.room_id = None;
        }
    }

    /// Periodic snapshot of every live room.
    pub async fn autosave(&self) {
        let mut snapshots = Vec::new();
        for flow in self.all_flows() {
            let game = flow.room.game.lock().await;
            if game.lifecycle != Lifecycle::Ended {
                snapshots.push(snapshot(&game));
            }
        }
        if let Err(e) = self.store.save_all(&snapshots) {
            warn!(error = %e, "autosave failed");
        }
    }

    /// Drop rooms nobody will come back to: ended rooms after a grace
    /// period, abandoned running rooms, and stale waiting rooms.
    pub async fn cleanup(&self) {
        let now = now_millis();
        let mut doomed = Vec::new();
        for flow in self.all_flows() {
            let game = flow.room.game.lock().await;
            let idle = Duration::from_millis((now - game.last_activity).max(0) as u64);
            let drop_it = match game.lifecycle {
                Lifecycle::Ended => idle >= self.cfg.ended_room_ttl,
                Lifecycle::Playing => {
                    game.human_seats().all(|s| !s.is_online) && idle >= self.cfg.abandoned_room_ttl
                }
                Lifecycle::Waiting => idle >= self.cfg.waiting_room_ttl,
            };
            if drop_it {
                doomed.push((game.room_id.clone(), game.lifecycle));
            }
        }
        for (room_id, lifecycle) in doomed {
            info!(room_id = %room_id, ?lifecycle, "cleaning up room");
            if let Some((_, flow)) = self.rooms.remove(&room_id) {
                flow.room.invalidate();
                let game = flow.room.game.lock().await;
                for seat in game.human_seats() {
                    self.clear_membership(&seat.id);
                }
            }
        }
    }

    /// Background autosave and cleanup loops; spawned once at startup.
    pub fn spawn_background_tasks(self: &Arc<Self>) {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(registry.cfg.autosave_interval);
            loop {
                tick.tick().await;
                registry.autosave().await;
            }
        });
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(registry.cfg.cleanup_interval);
            loop {
                tick.tick().await;
                registry.cleanup().await;
            }
        });
    }
}

fn require_waiting_host(game: &Game, user_id: &str) -> Result<(), DomainError> {
    if game.host_id != user_id {
        return Err(DomainError::conflict(
            ConflictKind::NotHost,
            "only the host can do that",
        ));
    }
    if game.lifecycle != Lifecycle::Waiting {
        return Err(DomainError::conflict(
            ConflictKind::GameAlreadyStarted,
            "the game is already running",
        ));
    }
    Ok(())
}

/// One recipient's full view of the room, including what they owe right
/// now. Doubles as the resume payload after a reconnect.
pub(crate) fn room_state_for(game: &Game, recipient: &str) -> ServerMsg {
    let recipient_team = game
        .seat(recipient)
        .and_then(|s| s.role.as_ref())
        .map(Role::team);
    let is_wolf = recipient_team == Some(Team::Wolf);
    let reveal_all = game.lifecycle == Lifecycle::Ended;

    let seats: Vec<SeatInfo> = seat_infos(game, reveal_all)
        .into_iter()
        .map(|mut info| {
            if !reveal_all {
                let seat_team = game
                    .seat(&info.id)
                    .and_then(|s| s.role.as_ref())
                    .map(Role::team);
                let visible =
                    info.id == recipient || (is_wolf && seat_team == Some(Team::Wolf));
                if visible {
                    info.role = game.seat(&info.id).and_then(|s| s.role.clone());
                }
            }
            info
        })
        .collect();

    let action_required = pending_action_for(game, recipient);
    // Self-votes are legal, so the voter appears in their own list just as
    // the live prompt sends it.
    let candidates = match action_required.as_deref() {
        Some("vote") | Some("hunter_shoot") => game
            .alive_seats()
            .map(|s| crate::domain::roles::TargetOption {
                id: s.id.clone(),
                name: s.name.clone(),
                action: None,
                label: None,
            })
            .collect(),
        Some(_) => possible_targets(game, recipient),
        None => Vec::new(),
    };

    let speaking_turn = game.current_speaker.as_ref().map(|id| SpeakingTurn {
        speaker: id.clone(),
        speaker_name: game.seat(id).map_or_else(|| id.clone(), |s| s.name.clone()),
        position: game.current_speaker_index,
        total: game.speaking_order.len(),
    });

    ServerMsg::RoomState {
        room_id: game.room_id.clone(),
        host_id: game.host_id.clone(),
        lifecycle: game.lifecycle,
        phase: game.phase,
        day_number: game.day_number,
        seats,
        messages: game.messages.clone(),
        wolf_chat: if is_wolf {
            game.wolf_chat.clone()
        } else {
            Vec::new()
        },
        paused: game.paused,
        action_required,
        candidates,
        speaking_turn,
    }
}

/// What `recipient` owes right now, if anything.
fn pending_action_for(game: &Game, recipient: &str) -> Option<String> {
    if game.lifecycle != Lifecycle::Playing {
        return None;
    }
    if game.pending_hunter_shot.as_deref() == Some(recipient) {
        return Some("hunter_shoot".to_string());
    }
    let seat = game.seat(recipient)?;
    if !seat.is_alive {
        return None;
    }
    match game.phase {
        Some(Phase::Night) => {
            let kind = seat.role_kind()?;
            if kind.acts_at_night() && game.night_action(recipient).is_none() {
                Some(kind.as_str().to_string())
            } else {
                None
            }
        }
        Some(Phase::Vote) => {
            if seat.can_vote && !game.votes.contains_key(recipient) {
                Some("vote".to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}
