//! Axum route handlers for the Optimization API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::{apply, ResumeDocument};
use crate::errors::AppError;
use crate::jobs::analysis::{extract_keywords, JobKeywords};
use crate::jobs::handlers::require_job_description;
use crate::optimizer::orchestrator::{OptimizationRequest, OptimizationResult, ProviderSelection};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OptimizeDocumentRequest {
    pub document: ResumeDocument,
    /// Block ids to refine, processed in this order.
    pub section_ids: Vec<String>,
    pub job_description: String,
    #[serde(default)]
    pub provider: ProviderSelection,
    #[serde(default)]
    pub additional_instructions: Option<String>,
    /// Pre-extracted keywords; extracted from the job description when absent.
    #[serde(default)]
    pub keywords: Option<JobKeywords>,
}

#[derive(Debug, Serialize)]
pub struct OptimizeDocumentResponse {
    pub document: ResumeDocument,
    pub results: Vec<OptimizationResult>,
    pub keywords: JobKeywords,
    pub used_default_keywords: bool,
    pub succeeded: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/optimize
///
/// Refines the selected sections one after another and merges each successful
/// rewrite into the returned document. Failed sections keep their original
/// text and report the error in their result.
pub async fn handle_optimize(
    State(state): State<AppState>,
    Json(request): Json<OptimizeDocumentRequest>,
) -> Result<Json<OptimizeDocumentResponse>, AppError> {
    require_job_description(&request.job_description)?;
    if request.section_ids.is_empty() {
        return Err(AppError::Validation(
            "section_ids must name at least one section".to_string(),
        ));
    }
    request.document.validate()?;
    if let Some(missing) = request
        .section_ids
        .iter()
        .find(|id| request.document.block(id).is_none())
    {
        return Err(AppError::Validation(format!("unknown section '{missing}'")));
    }

    let (keywords, used_default_keywords) = match request.keywords {
        Some(keywords) => (keywords, false),
        None => {
            let extraction = extract_keywords(
                &state.orchestrator,
                &request.job_description,
                request.provider,
                state.providers(),
            )
            .await;
            (extraction.keywords, extraction.used_defaults)
        }
    };

    let mut document = request.document;
    let mut results = Vec::with_capacity(request.section_ids.len());

    for section_id in request.section_ids {
        let original_text = document
            .block(&section_id)
            .map(|b| b.text.clone())
            .unwrap_or_default();

        let optimization = OptimizationRequest {
            section_id,
            original_text,
            job_description: request.job_description.clone(),
            provider: request.provider,
            additional_instructions: request.additional_instructions.clone(),
            keywords: Some(keywords.clone()),
        };

        let result = state.orchestrator.optimize(&optimization, state.providers()).await;
        if let Some(text) = result.optimized_text.as_deref() {
            document = apply(&document, &result.section_id, text)?;
        }
        results.push(result);
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    info!("Optimized {}/{} sections", succeeded, results.len());

    Ok(Json(OptimizeDocumentResponse {
        document,
        results,
        keywords,
        used_default_keywords,
        succeeded,
    }))
}
