//! Optimizer Orchestrator: picks providers, retries transient failures and
//! falls back down the priority list.
//!
//! Calls are strictly sequential: one outbound request at a time, each bounded
//! by the provider's own timeout. The orchestrator holds no mutable state; the
//! provider list is passed in by the caller on every call.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::jobs::analysis::JobKeywords;
use crate::llm_client::{CompletionAdapter, ErrorKind, Prompt, ProviderConfig, ProviderError, ProviderKind};
use crate::optimizer::prompts::build_refine_prompt;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(8000);

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Exponential backoff between attempts on the same provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl Backoff {
    /// Delay before the `retry`-th retry (1-based): base, 2×base, 4×base, … capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Which provider(s) a request may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderSelection {
    /// Every configured provider, in priority order.
    #[default]
    Auto,
    Named(ProviderKind),
}

impl FromStr for ProviderSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(ProviderSelection::Auto)
        } else {
            s.parse().map(ProviderSelection::Named)
        }
    }
}

impl TryFrom<String> for ProviderSelection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProviderSelection> for String {
    fn from(selection: ProviderSelection) -> Self {
        selection.to_string()
    }
}

impl fmt::Display for ProviderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderSelection::Auto => f.write_str("auto"),
            ProviderSelection::Named(kind) => write!(f, "{kind}"),
        }
    }
}

/// One section rewrite, created per user action.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationRequest {
    pub section_id: String,
    pub original_text: String,
    pub job_description: String,
    #[serde(default)]
    pub provider: ProviderSelection,
    #[serde(default)]
    pub additional_instructions: Option<String>,
    /// Extracted job keywords to steer the rewrite.
    #[serde(default)]
    pub keywords: Option<JobKeywords>,
}

/// What went wrong, and where.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub provider: Option<ProviderKind>,
    pub message: String,
}

impl ErrorDetail {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Configuration,
            provider: None,
            message: message.into(),
        }
    }

    fn from_provider(provider: ProviderKind, error: &ProviderError) -> Self {
        Self {
            kind: error.kind(),
            provider: Some(provider),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.provider {
            Some(provider) => write!(f, "{provider}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Outcome of one section rewrite. Never persisted.
///
/// `provider` is set exactly when `success` is true; `optimized_text` is
/// never populated on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub section_id: String,
    pub optimized_text: Option<String>,
    pub provider: Option<ProviderKind>,
    pub success: bool,
    pub error: Option<ErrorDetail>,
    /// Adapter calls made across all candidates.
    pub attempts: u32,
}

/// A successful completion and who produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub provider: ProviderKind,
    pub attempts: u32,
}

/// Every candidate failed, or none could be selected.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionFailure {
    pub error: ErrorDetail,
    pub attempts: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Orchestrator {
    adapter: Arc<dyn CompletionAdapter>,
    backoff: Backoff,
}

impl Orchestrator {
    pub fn new(adapter: Arc<dyn CompletionAdapter>, backoff: Backoff) -> Self {
        Self { adapter, backoff }
    }

    /// Rewrites one resume section. Failure is reported in the result, not as an error.
    pub async fn optimize(
        &self,
        request: &OptimizationRequest,
        providers: &[ProviderConfig],
    ) -> OptimizationResult {
        let prompt = build_refine_prompt(request);

        match self.complete(&prompt, request.provider, providers).await {
            Ok(completion) => OptimizationResult {
                section_id: request.section_id.clone(),
                optimized_text: Some(completion.text.trim().to_string()),
                provider: Some(completion.provider),
                success: true,
                error: None,
                attempts: completion.attempts,
            },
            Err(failure) => {
                warn!(
                    section = %request.section_id,
                    attempts = failure.attempts,
                    "optimization failed: {}",
                    failure.error
                );
                OptimizationResult {
                    section_id: request.section_id.clone(),
                    optimized_text: None,
                    provider: None,
                    success: false,
                    error: Some(failure.error),
                    attempts: failure.attempts,
                }
            }
        }
    }

    /// Runs `prompt` through the candidates for `selection` with retry and fallback.
    ///
    /// Steps:
    /// 1. Resolve candidates (named → that provider only, auto → all, in order)
    /// 2. Per candidate, up to `max_retries` attempts with backoff between them
    /// 3. Only `Timeout` / `RateLimited` are retried; anything else moves on
    /// 4. First success wins; exhaustion reports the last error seen
    pub async fn complete(
        &self,
        prompt: &Prompt,
        selection: ProviderSelection,
        providers: &[ProviderConfig],
    ) -> Result<Completion, CompletionFailure> {
        let candidates = candidates(selection, providers).map_err(|error| CompletionFailure {
            error,
            attempts: 0,
        })?;

        let mut attempts = 0;
        let mut last_error: Option<ErrorDetail> = None;

        for config in candidates {
            let max_attempts = config.max_retries.max(1);

            for attempt in 1..=max_attempts {
                if attempt > 1 {
                    let delay = self.backoff.delay_for(attempt - 1);
                    debug!(
                        provider = %config.kind,
                        "retrying after {}ms (attempt {}/{})",
                        delay.as_millis(),
                        attempt,
                        max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }

                attempts += 1;
                match self.adapter.complete(prompt, config).await {
                    Ok(text) => {
                        info!(provider = %config.kind, attempts, "completion succeeded");
                        return Ok(Completion {
                            text,
                            provider: config.kind,
                            attempts,
                        });
                    }
                    Err(err) => {
                        warn!(
                            provider = %config.kind,
                            "attempt {}/{} failed: {}",
                            attempt,
                            max_attempts,
                            err
                        );
                        let transient = err.is_transient();
                        last_error = Some(ErrorDetail::from_provider(config.kind, &err));
                        if !transient {
                            break;
                        }
                    }
                }
            }
        }

        Err(CompletionFailure {
            error: last_error
                .unwrap_or_else(|| ErrorDetail::configuration("no provider was attempted")),
            attempts,
        })
    }
}

/// Resolves the ordered candidate list. Fails before any network call.
fn candidates(
    selection: ProviderSelection,
    providers: &[ProviderConfig],
) -> Result<Vec<&ProviderConfig>, ErrorDetail> {
    match selection {
        ProviderSelection::Auto if providers.is_empty() => Err(ErrorDetail::configuration(
            "no providers are configured; set at least one provider API key",
        )),
        ProviderSelection::Auto => Ok(providers.iter().collect()),
        ProviderSelection::Named(kind) => providers
            .iter()
            .find(|p| p.kind == kind)
            .map(|p| vec![p])
            .ok_or_else(|| ErrorDetail::configuration(format!("provider '{kind}' is not configured"))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
