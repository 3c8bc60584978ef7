//! Shared state for one live room: the game aggregate behind an async lock
//! plus the session counter that serializes orchestration runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::domain::state::Game;

/// One room's live state.
///
/// Exactly one orchestration run is authoritative at a time. Starting a run
/// bumps `session` and takes the new value as its token; after every await
/// point the run re-checks its token against the counter and abandons
/// itself if superseded. Pause, resume, exit, and restart all bump the
/// counter, which is the only invalidation mechanism.
pub struct GameRoom {
    pub game: Mutex<Game>,
    session: AtomicU64,
    /// Woken by a human speaker ending their turn early, and by their chat.
    pub speech_notify: Notify,
    /// Woken by each incoming vote.
    pub vote_notify: Notify,
    /// Woken by a hunter submitting (or declining) the shot.
    pub shot_notify: Notify,
}

impl GameRoom {
    pub fn new(game: Game) -> Arc<Self> {
        Arc::new(Self {
            game: Mutex::new(game),
            session: AtomicU64::new(0),
            speech_notify: Notify::new(),
            vote_notify: Notify::new(),
            shot_notify: Notify::new(),
        })
    }

    /// Start a new authoritative run, superseding any previous one.
    pub fn begin_run(&self) -> u64 {
        self.session.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Invalidate the current run without starting a new one.
    pub fn invalidate(&self) {
        self.session.fetch_add(1, Ordering::SeqCst);
    }

    pub fn session(&self) -> u64 {
        self.session.load(Ordering::SeqCst)
    }
}
