use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ProviderConfig;
use crate::optimizer::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Read-only after startup; nothing here is mutated by requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Configured providers in auto-mode priority order.
    pub fn providers(&self) -> &[ProviderConfig] {
        &self.config.providers
    }
}
