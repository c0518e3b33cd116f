//! Axum route handlers for document rendering support.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::document::manifest::{build_manifest, RenderManifest};
use crate::document::ResumeDocument;
use crate::errors::AppError;
use crate::jobs::analysis::extract_details;
use crate::optimizer::orchestrator::ProviderSelection;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ManifestRequest {
    pub document: ResumeDocument,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub provider: ProviderSelection,
}

/// POST /api/v1/resumes/manifest
///
/// Filename and PDF metadata for the external renderer. Title and company are
/// extracted from the job description when one is given.
pub async fn handle_manifest(
    State(state): State<AppState>,
    Json(request): Json<ManifestRequest>,
) -> Result<Json<RenderManifest>, AppError> {
    request.document.validate()?;

    let details = extract_details(
        &state.orchestrator,
        &request.job_description,
        request.provider,
        state.providers(),
    )
    .await;

    let today = chrono::Local::now().date_naive();
    Ok(Json(build_manifest(&request.document, details.as_ref(), today)))
}
