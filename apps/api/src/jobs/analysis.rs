//! Job description analysis: keyword inventory and title/company extraction.
//!
//! Both calls are best-effort. Keyword extraction falls back to a fixed default
//! set; detail extraction yields `None`. Neither ever fails the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::jobs::prompts::{
    DETAILS_PROMPT_TEMPLATE, DETAILS_SYSTEM, KEYWORDS_PROMPT_TEMPLATE, KEYWORDS_SYSTEM,
};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{extract_json_object, strip_json_fences, Prompt, ProviderConfig, ProviderKind};
use crate::optimizer::orchestrator::{Orchestrator, ProviderSelection};

/// Only the head of a job description is sent for keyword extraction.
const KEYWORD_JD_CHARS: usize = 2000;

/// Keyword inventory extracted from a job description.
///
/// Every field is required when parsing a completion; a reply missing any of
/// them is rejected rather than half-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobKeywords {
    pub technical_skills: Vec<String>,
    pub key_requirements: Vec<String>,
    pub ds_tools: Vec<String>,
    pub programming_languages: Vec<String>,
    pub metrics: Vec<String>,
    pub certifications: Vec<String>,
}

impl Default for JobKeywords {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            technical_skills: owned(&["Data Analysis", "Machine Learning", "Python"]),
            key_requirements: owned(&[
                "Analytical Skills",
                "Technical Communication",
                "Problem Solving",
            ]),
            ds_tools: owned(&["Pandas", "NumPy"]),
            programming_languages: owned(&["Python", "SQL"]),
            metrics: owned(&["process efficiency", "performance improvements"]),
            certifications: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordExtraction {
    pub keywords: JobKeywords,
    /// True when the defaults were substituted for a failed extraction.
    pub used_defaults: bool,
    pub provider: Option<ProviderKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub job_title: String,
    pub company_name: String,
}

#[derive(Debug, Error)]
pub enum KeywordParseError {
    #[error("no JSON object found in reply")]
    NoJsonObject,

    #[error("reply does not match the keyword schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Extracts the keyword inventory, falling back to defaults on any failure.
pub async fn extract_keywords(
    orchestrator: &Orchestrator,
    job_description: &str,
    selection: ProviderSelection,
    providers: &[ProviderConfig],
) -> KeywordExtraction {
    let head: String = job_description.chars().take(KEYWORD_JD_CHARS).collect();
    let prompt = Prompt::new(
        format!("{KEYWORDS_SYSTEM} {JSON_ONLY_SYSTEM}"),
        KEYWORDS_PROMPT_TEMPLATE.replace("{job_description}", &head),
    );

    let completion = match orchestrator.complete(&prompt, selection, providers).await {
        Ok(completion) => completion,
        Err(failure) => {
            warn!("keyword extraction failed, using defaults: {}", failure.error);
            return KeywordExtraction::defaults();
        }
    };

    match parse_keywords(&completion.text) {
        Ok(keywords) => {
            info!(
                provider = %completion.provider,
                "extracted {} technical skills",
                keywords.technical_skills.len()
            );
            KeywordExtraction {
                keywords,
                used_defaults: false,
                provider: Some(completion.provider),
            }
        }
        Err(e) => {
            warn!(
                provider = %completion.provider,
                "keyword reply rejected, using defaults: {e}; raw: {:?}",
                completion.text.chars().take(200).collect::<String>()
            );
            KeywordExtraction::defaults()
        }
    }
}

impl KeywordExtraction {
    fn defaults() -> Self {
        Self {
            keywords: JobKeywords::default(),
            used_defaults: true,
            provider: None,
        }
    }
}

/// Parses a keyword reply, tolerating code fences and surrounding chatter.
pub fn parse_keywords(reply: &str) -> Result<JobKeywords, KeywordParseError> {
    let cleaned = strip_json_fences(reply);
    match serde_json::from_str(cleaned) {
        Ok(keywords) => Ok(keywords),
        Err(direct) => {
            let object = extract_json_object(cleaned).ok_or(KeywordParseError::NoJsonObject)?;
            if object == cleaned {
                return Err(direct.into());
            }
            Ok(serde_json::from_str(object)?)
        }
    }
}

/// Extracts job title and company name. `None` when blank input, provider
/// failure, or an unparseable reply.
pub async fn extract_details(
    orchestrator: &Orchestrator,
    job_description: &str,
    selection: ProviderSelection,
    providers: &[ProviderConfig],
) -> Option<JobDetails> {
    if job_description.trim().is_empty() {
        return None;
    }

    let prompt = Prompt::new(
        DETAILS_SYSTEM,
        DETAILS_PROMPT_TEMPLATE.replace("{job_description}", job_description),
    );

    match orchestrator.complete(&prompt, selection, providers).await {
        Ok(completion) => {
            let details = parse_job_details(&completion.text);
            if details.is_none() {
                warn!(provider = %completion.provider, "could not split job details reply: {:?}", completion.text);
            }
            details
        }
        Err(failure) => {
            warn!("job details extraction failed: {}", failure.error);
            None
        }
    }
}

/// Parses `Job Title | Company Name`.
pub fn parse_job_details(reply: &str) -> Option<JobDetails> {
    let reply = reply.trim().trim_matches('"');
    let mut parts = reply.split('|');
    let (title, company) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let (title, company) = (title.trim(), company.trim());
    if title.is_empty() || company.is_empty() {
        return None;
    }

    Some(JobDetails {
        job_title: title.to_string(),
        company_name: company.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm_client::ProviderError;
    use crate::optimizer::orchestrator::Backoff;
    use crate::optimizer::testing::{provider, ScriptedAdapter};

    const KEYWORDS_JSON: &str = r#"{
        "technical_skills": ["Python", "Spark", "Airflow"],
        "key_requirements": ["5+ years experience", "Stakeholder management"],
        "ds_tools": ["Pandas"],
        "programming_languages": ["Python", "Scala"],
        "metrics": ["pipeline latency"],
        "certifications": []
    }"#;

    #[test]
    fn test_parse_keywords_plain_json() {
        let keywords = parse_keywords(KEYWORDS_JSON).unwrap();
        assert_eq!(keywords.technical_skills, vec!["Python", "Spark", "Airflow"]);
        assert!(keywords.certifications.is_empty());
    }

    #[test]
    fn test_parse_keywords_fenced_json() {
        let reply = format!("```json\n{KEYWORDS_JSON}\n```");
        let keywords = parse_keywords(&reply).unwrap();
        assert_eq!(keywords.programming_languages, vec!["Python", "Scala"]);
    }

    #[test]
    fn test_parse_keywords_embedded_in_chatter() {
        let reply = format!("Here is the analysis:\n{KEYWORDS_JSON}\nLet me know!");
        let keywords = parse_keywords(&reply).unwrap();
        assert_eq!(keywords.ds_tools, vec!["Pandas"]);
    }

    #[test]
    fn test_parse_keywords_rejects_missing_key() {
        let reply = r#"{"technical_skills": ["Python"], "key_requirements": []}"#;
        assert!(matches!(parse_keywords(reply), Err(KeywordParseError::Schema(_))));
    }

    #[test]
    fn test_parse_keywords_rejects_non_list_value() {
        let reply = KEYWORDS_JSON.replace(r#"["Pandas"]"#, r#""Pandas""#);
        assert!(parse_keywords(&reply).is_err());
    }

    #[test]
    fn test_parse_keywords_without_object() {
        assert!(matches!(
            parse_keywords("I could not find any keywords."),
            Err(KeywordParseError::NoJsonObject)
        ));
    }

    #[test]
    fn test_parse_job_details() {
        let details = parse_job_details("Senior Data Scientist | Acme Corp").unwrap();
        assert_eq!(details.job_title, "Senior Data Scientist");
        assert_eq!(details.company_name, "Acme Corp");

        let quoted = parse_job_details("\"Analyst | Globex\"").unwrap();
        assert_eq!(quoted.company_name, "Globex");

        assert!(parse_job_details("Senior Data Scientist at Acme").is_none());
        assert!(parse_job_details("a | b | c").is_none());
        assert!(parse_job_details(" | Acme").is_none());
    }

    #[tokio::test]
    async fn test_extract_keywords_uses_provider_reply() {
        let adapter = Arc::new(ScriptedAdapter::new());
        adapter.push(ProviderKind::Kimi, Ok(KEYWORDS_JSON.to_string()));
        let orchestrator = Orchestrator::new(adapter.clone(), Backoff::default());

        let extraction = extract_keywords(
            &orchestrator,
            "Data engineer with Spark",
            ProviderSelection::Auto,
            &[provider(ProviderKind::Kimi, 1)],
        )
        .await;

        assert!(!extraction.used_defaults);
        assert_eq!(extraction.provider, Some(ProviderKind::Kimi));
        assert_eq!(extraction.keywords.technical_skills[1], "Spark");
    }

    #[tokio::test]
    async fn test_extract_keywords_truncates_job_description() {
        let adapter = Arc::new(ScriptedAdapter::new());
        adapter.push(ProviderKind::Kimi, Ok(KEYWORDS_JSON.to_string()));
        let orchestrator = Orchestrator::new(adapter.clone(), Backoff::default());
        let long_jd = format!("{}TAIL_MARKER", "x".repeat(KEYWORD_JD_CHARS));

        extract_keywords(&orchestrator, &long_jd, ProviderSelection::Auto, &[provider(ProviderKind::Kimi, 1)]).await;

        let sent = adapter.prompts();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].user.contains("TAIL_MARKER"));
    }

    #[tokio::test]
    async fn test_extract_keywords_falls_back_on_bad_reply() {
        let adapter = Arc::new(ScriptedAdapter::new());
        adapter.push(ProviderKind::OpenAi, Ok("{\"technical_skills\": \"oops\"}".to_string()));
        let orchestrator = Orchestrator::new(adapter.clone(), Backoff::default());

        let extraction = extract_keywords(
            &orchestrator,
            "Any JD",
            ProviderSelection::Auto,
            &[provider(ProviderKind::OpenAi, 1)],
        )
        .await;

        assert!(extraction.used_defaults);
        assert_eq!(extraction.keywords, JobKeywords::default());
    }

    #[tokio::test]
    async fn test_extract_keywords_falls_back_without_providers() {
        let adapter = Arc::new(ScriptedAdapter::new());
        let orchestrator = Orchestrator::new(adapter.clone(), Backoff::default());

        let extraction = extract_keywords(&orchestrator, "Any JD", ProviderSelection::Auto, &[]).await;

        assert!(extraction.used_defaults);
        assert!(adapter.call_log().is_empty());
    }

    #[tokio::test]
    async fn test_extract_details_skips_blank_description() {
        let adapter = Arc::new(ScriptedAdapter::new());
        let orchestrator = Orchestrator::new(adapter.clone(), Backoff::default());

        let details =
            extract_details(&orchestrator, "   ", ProviderSelection::Auto, &[provider(ProviderKind::Kimi, 1)]).await;

        assert!(details.is_none());
        assert!(adapter.call_log().is_empty());
    }

    #[tokio::test]
    async fn test_extract_details_returns_none_on_provider_failure() {
        let adapter = Arc::new(ScriptedAdapter::new());
        adapter.push(
            ProviderKind::Deepseek,
            Err(ProviderError::AuthError {
                status: 401,
                message: "bad key".to_string(),
            }),
        );
        let orchestrator = Orchestrator::new(adapter.clone(), Backoff::default());

        let details = extract_details(
            &orchestrator,
            "Analyst at Globex",
            ProviderSelection::Auto,
            &[provider(ProviderKind::Deepseek, 3)],
        )
        .await;

        assert!(details.is_none());
        assert_eq!(adapter.calls_to(ProviderKind::Deepseek), 1);
    }
}
