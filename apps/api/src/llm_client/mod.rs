/// LLM Client: the single point of entry for all completion calls.
///
/// ARCHITECTURAL RULE: No other module may talk to a vendor API directly.
/// Everything goes through a [`CompletionAdapter`], which makes exactly one
/// attempt against exactly one provider. Retry and fallback live in the
/// optimizer, never here.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub mod prompts;
pub mod providers;

pub use providers::{ProviderConfig, ProviderKind, ProviderSummary};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("no response within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("credential rejected (status {status}): {message}")]
    AuthError { status: u16, message: String },

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("upstream error: {message}")]
    UpstreamError { status: Option<u16>, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("prompt must not be empty")]
    InvalidPrompt,
}

impl ProviderError {
    /// Whether retrying the same provider might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Timeout(_) | ProviderError::RateLimited(_))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Timeout(_) => ErrorKind::Timeout,
            ProviderError::AuthError { .. } => ErrorKind::AuthError,
            ProviderError::RateLimited(_) => ErrorKind::RateLimited,
            ProviderError::UpstreamError { .. } => ErrorKind::UpstreamError,
            ProviderError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            ProviderError::InvalidPrompt => ErrorKind::InvalidPrompt,
        }
    }
}

/// Flat error category reported back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    RateLimited,
    AuthError,
    MalformedResponse,
    UpstreamError,
    InvalidPrompt,
    Configuration,
}

/// A chat prompt: optional system message plus the user message.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            user: user.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user.trim().is_empty()
    }
}

/// One attempt, one vendor: prompt in, completion text out.
#[async_trait]
pub trait CompletionAdapter: Send + Sync {
    async fn complete(&self, prompt: &Prompt, config: &ProviderConfig) -> Result<String, ProviderError>;
}

/// HTTP adapter shared by every vendor variant.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
}

impl LlmClient {
    pub fn new() -> anyhow::Result<Self> {
        // Per-call timeouts come from each ProviderConfig.
        let client = Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CompletionAdapter for LlmClient {
    async fn complete(&self, prompt: &Prompt, config: &ProviderConfig) -> Result<String, ProviderError> {
        if prompt.is_empty() {
            return Err(ProviderError::InvalidPrompt);
        }

        let kind = config.kind;
        let mut request = self
            .client
            .post(&config.endpoint)
            .bearer_auth(config.api_key.expose_secret())
            .timeout(config.timeout)
            .json(&kind.request_body(config, prompt));
        for (name, value) in kind.extra_headers() {
            request = request.header(*name, *value);
        }

        debug!(provider = %kind, model = %config.model, "sending completion request");

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, config.timeout))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, config.timeout))?;

        if !status.is_success() {
            return Err(classify_status(kind, status.as_u16(), &body));
        }

        kind.parse_completion(&body)
    }
}

fn transport_error(error: reqwest::Error, timeout: Duration) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::UpstreamError {
            status: None,
            message: error.to_string(),
        }
    }
}

/// Maps a non-2xx status to the error taxonomy.
fn classify_status(kind: ProviderKind, status: u16, body: &str) -> ProviderError {
    let message = kind.parse_error_message(body);
    match status {
        401 | 403 => ProviderError::AuthError { status, message },
        429 => ProviderError::RateLimited(message),
        _ => ProviderError::UpstreamError {
            status: Some(status),
            message: format!("HTTP {status}: {message}"),
        },
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Returns the outermost `{ ... }` span of `text`, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
