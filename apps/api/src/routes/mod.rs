pub mod health;
pub mod providers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::document::handlers as document;
use crate::jobs::handlers as jobs;
use crate::optimizer::handlers as optimizer;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/providers", get(providers::providers_handler))
        // Resume API
        .route("/api/v1/resumes/optimize", post(optimizer::handle_optimize))
        .route("/api/v1/resumes/manifest", post(document::handle_manifest))
        // Jobs API
        .route("/api/v1/jobs/keywords", post(jobs::handle_extract_keywords))
        .route("/api/v1/jobs/details", post(jobs::handle_extract_details))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::document::tests::sample_document;
    use crate::llm_client::{ProviderError, ProviderKind};
    use crate::optimizer::orchestrator::{Backoff, Orchestrator};
    use crate::optimizer::testing::{provider, ScriptedAdapter};

    const KEYWORDS_JSON: &str = r#"{"technical_skills": ["SQL", "dbt"], "key_requirements": ["ownership"],
        "ds_tools": [], "programming_languages": ["Python"], "metrics": [], "certifications": []}"#;

    fn app(adapter: &Arc<ScriptedAdapter>, kinds: &[ProviderKind]) -> Router {
        let config = Config {
            providers: kinds.iter().map(|k| provider(*k, 2)).collect(),
            disabled_providers: vec![ProviderKind::Deepseek],
            backoff: Backoff::default(),
            port: 0,
            rust_log: "info".to_string(),
        };
        build_router(AppState {
            config: Arc::new(config),
            orchestrator: Orchestrator::new(adapter.clone(), Backoff::default()),
        })
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let adapter = Arc::new(ScriptedAdapter::new());
        let (status, body) = send(app(&adapter, &[]), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_providers_lists_priority_without_secrets() {
        let adapter = Arc::new(ScriptedAdapter::new());
        let (status, body) = send(
            app(&adapter, &[ProviderKind::OpenAi, ProviderKind::Kimi]),
            "GET",
            "/api/v1/providers",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["providers"][0]["name"], "openai");
        assert_eq!(body["providers"][1]["name"], "kimi");
        assert_eq!(body["disabled"], json!(["deepseek"]));
        assert!(!body.to_string().contains("test-key"));
    }

    #[tokio::test]
    async fn test_optimize_merges_successful_sections() {
        let adapter = Arc::new(ScriptedAdapter::new());
        adapter.push(ProviderKind::Kimi, Ok(KEYWORDS_JSON.to_string()));
        adapter.push(ProviderKind::Kimi, Ok("Shipped dbt models feeding revenue dashboards.".to_string()));

        let (status, body) = send(
            app(&adapter, &[ProviderKind::Kimi]),
            "POST",
            "/api/v1/resumes/optimize",
            Some(json!({
                "document": sample_document(),
                "section_ids": ["acme-1"],
                "job_description": "Analytics engineer. SQL, dbt, Python."
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["used_default_keywords"], false);
        assert_eq!(body["keywords"]["technical_skills"], json!(["SQL", "dbt"]));
        assert_eq!(body["succeeded"], 1);
        assert_eq!(body["results"][0]["provider"], "kimi");
        assert_eq!(
            body["document"]["sections"][1]["blocks"][0]["text"],
            "Shipped dbt models feeding revenue dashboards."
        );
        assert_eq!(
            body["document"]["sections"][1]["blocks"][1]["text"],
            "Automated data quality checks."
        );

        let prompts = adapter.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].user.contains("Key skills to highlight: SQL, dbt"));
    }

    #[tokio::test]
    async fn test_optimize_failure_keeps_original_text() {
        let adapter = Arc::new(ScriptedAdapter::new());
        adapter.always(
            ProviderKind::OpenAi,
            Err(ProviderError::AuthError {
                status: 401,
                message: "invalid api key".to_string(),
            }),
        );

        let (status, body) = send(
            app(&adapter, &[ProviderKind::OpenAi]),
            "POST",
            "/api/v1/resumes/optimize",
            Some(json!({
                "document": sample_document(),
                "section_ids": ["summary"],
                "job_description": "Data scientist",
                "provider": "openai",
                "keywords": {
                    "technical_skills": [], "key_requirements": [], "ds_tools": [],
                    "programming_languages": [], "metrics": [], "certifications": []
                }
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["succeeded"], 0);
        assert_eq!(body["results"][0]["success"], false);
        assert_eq!(body["results"][0]["error"]["kind"], "auth_error");
        assert_eq!(body["results"][0]["optimized_text"], Value::Null);
        assert_eq!(
            body["document"]["sections"][0]["blocks"][0]["text"],
            "Analyst with 4 years of experience."
        );
        // Supplied keywords skip extraction; auth errors are not retried.
        assert_eq!(adapter.calls_to(ProviderKind::OpenAi), 1);
    }

    #[tokio::test]
    async fn test_optimize_rejects_unknown_section_before_calling_providers() {
        let adapter = Arc::new(ScriptedAdapter::new());
        let (status, body) = send(
            app(&adapter, &[ProviderKind::Kimi]),
            "POST",
            "/api/v1/resumes/optimize",
            Some(json!({
                "document": sample_document(),
                "section_ids": ["summary", "does-not-exist"],
                "job_description": "Data scientist"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(adapter.call_log().is_empty());
    }

    #[tokio::test]
    async fn test_optimize_rejects_blank_job_description() {
        let adapter = Arc::new(ScriptedAdapter::new());
        let (status, _) = send(
            app(&adapter, &[ProviderKind::Kimi]),
            "POST",
            "/api/v1/resumes/optimize",
            Some(json!({
                "document": sample_document(),
                "section_ids": ["summary"],
                "job_description": "  "
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_optimize_without_providers_reports_configuration_error() {
        let adapter = Arc::new(ScriptedAdapter::new());
        let (status, body) = send(
            app(&adapter, &[]),
            "POST",
            "/api/v1/resumes/optimize",
            Some(json!({
                "document": sample_document(),
                "section_ids": ["summary"],
                "job_description": "Data scientist"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["used_default_keywords"], true);
        assert_eq!(body["results"][0]["error"]["kind"], "configuration");
        assert!(adapter.call_log().is_empty());
    }

    #[tokio::test]
    async fn test_job_details_endpoint() {
        let adapter = Arc::new(ScriptedAdapter::new());
        adapter.push(ProviderKind::Deepseek, Ok("Data Scientist | Acme Corp".to_string()));

        let (status, body) = send(
            app(&adapter, &[ProviderKind::Deepseek]),
            "POST",
            "/api/v1/jobs/details",
            Some(json!({"job_description": "Acme Corp is hiring a Data Scientist."})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["details"]["job_title"], "Data Scientist");
        assert_eq!(body["details"]["company_name"], "Acme Corp");
    }

    #[tokio::test]
    async fn test_keywords_endpoint_falls_back_to_defaults() {
        let adapter = Arc::new(ScriptedAdapter::new());
        adapter.push(ProviderKind::Kimi, Ok("Sorry, I can't help with that.".to_string()));

        let (status, body) = send(
            app(&adapter, &[ProviderKind::Kimi]),
            "POST",
            "/api/v1/jobs/keywords",
            Some(json!({"job_description": "Anything"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["used_defaults"], true);
        assert_eq!(body["keywords"]["programming_languages"], json!(["Python", "SQL"]));
    }

    #[tokio::test]
    async fn test_manifest_uses_extracted_details() {
        let adapter = Arc::new(ScriptedAdapter::new());
        adapter.push(ProviderKind::Kimi, Ok("ML Engineer | Globex".to_string()));

        let (status, body) = send(
            app(&adapter, &[ProviderKind::Kimi]),
            "POST",
            "/api/v1/resumes/manifest",
            Some(json!({
                "document": sample_document(),
                "job_description": "Globex is hiring an ML Engineer."
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let filename = body["filename"].as_str().unwrap();
        assert!(filename.starts_with("Resume_ML_Engineer-Globex_"));
        assert!(filename.ends_with(".pdf"));
        assert_eq!(body["metadata"]["author"], "Jordan Lee");
    }

    #[tokio::test]
    async fn test_manifest_without_job_description_skips_providers() {
        let adapter = Arc::new(ScriptedAdapter::new());

        let (status, body) = send(
            app(&adapter, &[ProviderKind::Kimi]),
            "POST",
            "/api/v1/resumes/manifest",
            Some(json!({"document": sample_document()})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job_title"], "Jordan Lee");
        assert!(adapter.call_log().is_empty());
    }
}
