#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod ai;
pub mod config;
pub mod domain;
pub mod error;
pub mod errors;
pub mod health;
pub mod protocol;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod trace_ctx;
pub mod ws;

// Re-exports for public API
pub use ai::{DecisionProvider, LlmProvider, RandomProvider};
pub use config::game::GameConfig;
pub use config::provider::ProviderConfig;
pub use domain::{Game, GameSnapshot, Phase, Role, RoleKind, Winner};
pub use error::AppError;
pub use services::{GameFlow, GameRoom, RoomRegistry};
pub use state::app_state::AppState;
pub use storage::{JsonFileStore, SnapshotStore};
pub use ws::WsRegistry;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_test_writer())
        .try_init();
}
