//! Decision provider trait: everything an AI seat has to decide.

use std::fmt;

use async_trait::async_trait;

use crate::domain::player_view::PlayerView;
use crate::domain::roles::TargetOption;
use crate::domain::state::NightActionKind;
use crate::error::AppError;

/// Errors from a decision provider.
#[derive(Debug)]
pub enum AiError {
    /// Provider call exceeded its deadline.
    Timeout,
    /// Transport or provider-internal failure.
    Internal(String),
    /// Provider answered with something no legal decision matches.
    InvalidDecision(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::Timeout => write!(f, "AI decision timeout"),
            AiError::Internal(msg) => write!(f, "AI internal error: {msg}"),
            AiError::InvalidDecision(msg) => write!(f, "AI invalid decision: {msg}"),
        }
    }
}

impl std::error::Error for AiError {}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        AppError::internal(format!("AI error: {err}"))
    }
}

/// A night decision. `target` is an alias from the provider's view and must
/// be unmasked by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct NightDecision {
    pub action: NightActionKind,
    pub target: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteDecision {
    /// Alias of the accused; `None` abstains.
    pub target: Option<String>,
    pub reason: Option<String>,
}

/// Decision source for AI seats. Implementations see only a masked
/// [`PlayerView`] and answer in its aliases.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Pick a night action from the legal `candidates` (empty means the
    /// seat has nothing to do tonight and should answer `None`).
    async fn night_action(
        &self,
        view: &PlayerView,
        candidates: &[TargetOption],
    ) -> Result<NightDecision, AiError>;

    /// Pick a vote target from the living candidates' aliases.
    async fn vote(&self, view: &PlayerView, candidates: &[String]) -> Result<VoteDecision, AiError>;

    /// Pick a hunter shot target, or decline.
    async fn hunter_shot(
        &self,
        view: &PlayerView,
        candidates: &[String],
    ) -> Result<Option<String>, AiError>;

    /// Produce one to three day-speech messages.
    async fn speak(&self, view: &PlayerView) -> Result<Vec<String>, AiError>;

    /// Produce one wolf-channel message, or stay quiet.
    async fn wolf_speak(&self, view: &PlayerView) -> Result<Option<String>, AiError>;
}
