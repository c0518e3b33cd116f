//! Axum route handlers for the Jobs API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::jobs::analysis::{extract_details, extract_keywords, JobDetails, KeywordExtraction};
use crate::optimizer::orchestrator::ProviderSelection;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JobDescriptionRequest {
    pub job_description: String,
    #[serde(default)]
    pub provider: ProviderSelection,
}

#[derive(Debug, Serialize)]
pub struct JobDetailsResponse {
    pub details: Option<JobDetails>,
}

/// POST /api/v1/jobs/keywords
///
/// Always answers with a keyword set; `used_defaults` flags a fallback.
pub async fn handle_extract_keywords(
    State(state): State<AppState>,
    Json(request): Json<JobDescriptionRequest>,
) -> Result<Json<KeywordExtraction>, AppError> {
    require_job_description(&request.job_description)?;

    let extraction = extract_keywords(
        &state.orchestrator,
        &request.job_description,
        request.provider,
        state.providers(),
    )
    .await;

    Ok(Json(extraction))
}

/// POST /api/v1/jobs/details
pub async fn handle_extract_details(
    State(state): State<AppState>,
    Json(request): Json<JobDescriptionRequest>,
) -> Result<Json<JobDetailsResponse>, AppError> {
    require_job_description(&request.job_description)?;

    let details = extract_details(
        &state.orchestrator,
        &request.job_description,
        request.provider,
        state.providers(),
    )
    .await;

    Ok(Json(JobDetailsResponse { details }))
}

pub(crate) fn require_job_description(job_description: &str) -> Result<(), AppError> {
    if job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    Ok(())
}
