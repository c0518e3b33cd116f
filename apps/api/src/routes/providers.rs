use axum::{extract::State, Json};
use serde::Serialize;

use crate::llm_client::{ProviderKind, ProviderSummary};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    /// Auto-mode priority order.
    pub providers: Vec<ProviderSummary>,
    pub disabled: Vec<ProviderKind>,
}

/// GET /api/v1/providers
pub async fn providers_handler(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state.providers().iter().map(|p| p.summary()).collect(),
        disabled: state.config.disabled_providers.clone(),
    })
}
