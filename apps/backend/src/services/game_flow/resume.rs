//! Pause, resume, and re-entry after a snapshot restore. A resumed run is a
//! brand-new session; whatever task the pause stranded dies at its next
//! liveness check.

use tracing::info;

use super::GameFlow;
use crate::domain::state::{Lifecycle, Phase};
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError};
use crate::protocol::ServerMsg;

impl GameFlow {
    pub async fn pause(&self, player_id: &str) -> Result<(), AppError> {
        let mut game = self.room.game.lock().await;
        if game.host_id != player_id {
            return Err(
                DomainError::conflict(ConflictKind::NotHost, "only the host can pause").into(),
            );
        }
        if game.lifecycle != Lifecycle::Playing || game.paused {
            return Err(DomainError::conflict(
                ConflictKind::Other("NOT_RUNNING".to_string()),
                "nothing to pause",
            )
            .into());
        }
        game.paused = true;
        game.touch();
        info!(room_id = %game.room_id, "game paused");
        self.room.invalidate();
        self.broadcast(&game, &ServerMsg::GamePaused);
        Ok(())
    }

    pub async fn resume(&self, player_id: &str) -> Result<(), AppError> {
        {
            let mut game = self.room.game.lock().await;
            if game.host_id != player_id {
                return Err(DomainError::conflict(
                    ConflictKind::NotHost,
                    "only the host can resume",
                )
                .into());
            }
            if game.lifecycle != Lifecycle::Playing || !game.paused {
                return Err(DomainError::conflict(
                    ConflictKind::Other("NOT_PAUSED".to_string()),
                    "nothing to resume",
                )
                .into());
            }
            game.paused = false;
            game.touch();
            info!(room_id = %game.room_id, "game resumed");
            self.broadcast(&game, &ServerMsg::GameResumed);
        }
        self.spawn_resume();
        Ok(())
    }

    /// Start a fresh run that picks the phase loop back up wherever the
    /// game stands. Used after resume and after a boot-time restore.
    pub fn spawn_resume(&self) {
        let flow = self.clone();
        let token = self.room.begin_run();
        tokio::spawn(async move {
            flow.resume_loop(token).await;
        });
    }

    pub(crate) async fn resume_loop(&self, token: u64) {
        // An interrupted hunter shot blocks whatever phase comes next.
        if !self.resolve_pending_hunter(token).await {
            return;
        }
        let (phase, speaker_index) = {
            let mut game = self.room.game.lock().await;
            if game.lifecycle != Lifecycle::Playing || game.paused {
                return;
            }
            if self.check_end(&mut game) {
                return;
            }
            (game.phase, game.current_speaker_index)
        };
        match phase {
            Some(Phase::Night) => self.night_continue(token).await,
            Some(Phase::Day) => {
                let start = speaker_index.saturating_sub(1);
                self.speak_from(token, start).await;
            }
            Some(Phase::Vote) => self.run_vote(token).await,
            None => self.run_night(token).await,
        }
    }
}
