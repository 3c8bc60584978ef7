use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// All pacing knobs for the phase loop, in one place. Production values come
/// from [`GameConfig::default`] with per-knob env overrides; tests use
/// [`GameConfig::fast`] so the loop runs in virtual time.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Poll interval while waiting for night submissions.
    pub night_poll: Duration,
    /// Hard ceiling on one night step; missing actors forfeit.
    pub night_ceiling: Duration,
    /// Per-speaker ceiling for human day speech.
    pub speech_timeout: Duration,
    /// Length of the day vote countdown.
    pub vote_time: Duration,
    /// Wolf-channel discussion window when a human wolf is alive.
    pub wolf_discussion: Duration,
    /// Ceiling on a pending hunter shot before it is forfeited.
    pub hunter_timeout: Duration,
    /// One decision provider call; a timeout falls back to a random legal
    /// choice.
    pub provider_timeout: Duration,
    /// Pause before an AI seat starts speaking.
    pub speech_lead_in: Duration,
    /// Gap between consecutive AI speech messages.
    pub speech_gap: Duration,
    /// Interval of the background snapshot task.
    pub autosave_interval: Duration,
    /// Sweep interval of the background cleanup task.
    pub cleanup_interval: Duration,
    /// Ended rooms are dropped after this long.
    pub ended_room_ttl: Duration,
    /// Rooms whose humans are all offline are dropped after this long.
    pub abandoned_room_ttl: Duration,
    /// Idle waiting rooms are dropped after this long.
    pub waiting_room_ttl: Duration,
    /// Snapshot file path.
    pub store_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            night_poll: Duration::from_millis(500),
            night_ceiling: Duration::from_secs(30),
            speech_timeout: Duration::from_secs(120),
            vote_time: Duration::from_secs(30),
            wolf_discussion: Duration::from_secs(30),
            hunter_timeout: Duration::from_secs(30),
            provider_timeout: Duration::from_secs(30),
            speech_lead_in: Duration::from_millis(800),
            speech_gap: Duration::from_millis(4000),
            autosave_interval: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(60),
            ended_room_ttl: Duration::from_secs(30 * 60),
            abandoned_room_ttl: Duration::from_secs(10 * 60),
            waiting_room_ttl: Duration::from_secs(60 * 60),
            store_path: PathBuf::from("rooms.json"),
        }
    }
}

impl GameConfig {
    /// Defaults with env overrides applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(secs) = env_secs("GAME_SPEECH_TIMEOUT_SECS") {
            cfg.speech_timeout = secs;
        }
        if let Some(secs) = env_secs("GAME_VOTE_TIME_SECS") {
            cfg.vote_time = secs;
        }
        if let Some(secs) = env_secs("GAME_NIGHT_CEILING_SECS") {
            cfg.night_ceiling = secs;
        }
        if let Some(secs) = env_secs("GAME_WOLF_DISCUSSION_SECS") {
            cfg.wolf_discussion = secs;
        }
        if let Some(secs) = env_secs("GAME_AUTOSAVE_SECS") {
            cfg.autosave_interval = secs;
        }
        if let Ok(path) = env::var("GAME_STORE_PATH") {
            cfg.store_path = PathBuf::from(path);
        }
        cfg
    }

    /// Millisecond-scale pacing for tests driven with a paused tokio clock.
    pub fn fast() -> Self {
        Self {
            night_poll: Duration::from_millis(5),
            night_ceiling: Duration::from_millis(200),
            speech_timeout: Duration::from_millis(100),
            vote_time: Duration::from_millis(50),
            wolf_discussion: Duration::from_millis(50),
            hunter_timeout: Duration::from_millis(100),
            provider_timeout: Duration::from_millis(50),
            speech_lead_in: Duration::ZERO,
            speech_gap: Duration::ZERO,
            autosave_interval: Duration::from_millis(100),
            cleanup_interval: Duration::from_millis(100),
            ended_room_ttl: Duration::from_millis(500),
            abandoned_room_ttl: Duration::from_millis(500),
            waiting_room_ttl: Duration::from_millis(500),
            store_path: PathBuf::from("rooms.json"),
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}
