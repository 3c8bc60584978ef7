//! Provider registry.
//!
//! Providers register here with a stable name and version; room setup looks
//! them up by name. Keep ordering stable and constructors side-effect free.

use std::sync::Arc;

use crate::ai::{DecisionProvider, RandomProvider};

pub struct ProviderFactory {
    pub name: &'static str,
    pub version: &'static str,
    pub make: fn(seed: Option<u64>) -> Arc<dyn DecisionProvider>,
}

static PROVIDER_FACTORIES: &[ProviderFactory] = &[ProviderFactory {
    name: RandomProvider::NAME,
    version: RandomProvider::VERSION,
    make: make_random,
}];

pub fn registered_providers() -> &'static [ProviderFactory] {
    PROVIDER_FACTORIES
}

pub fn by_name(name: &str) -> Option<&'static ProviderFactory> {
    registered_providers()
        .iter()
        .find(|factory| factory.name == name)
}

fn make_random(seed: Option<u64>) -> Arc<dyn DecisionProvider> {
    Arc::new(RandomProvider::new(seed))
}
