//! AI seats: the decision provider trait and its implementations.

pub mod llm;
pub mod random;
pub mod registry;
pub mod trait_def;

pub use llm::LlmProvider;
pub use random::RandomProvider;
pub use registry::{by_name, registered_providers, ProviderFactory};
pub use trait_def::{AiError, DecisionProvider, NightDecision, VoteDecision};
