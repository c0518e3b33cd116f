use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::llm_client::providers::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
use crate::llm_client::{ProviderConfig, ProviderKind};
use crate::optimizer::orchestrator::{Backoff, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY};

/// Application configuration loaded from environment variables.
///
/// Providers without a credential are left out of `providers` rather than
/// failing startup; the remaining list is in auto-mode priority order.
#[derive(Debug, Clone)]
pub struct Config {
    pub providers: Vec<ProviderConfig>,
    /// Listed in the priority order but missing a credential.
    pub disabled_providers: Vec<ProviderKind>,
    pub backoff: Backoff,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let priority = match non_blank(&lookup, "PROVIDER_PRIORITY") {
            Some(raw) => parse_priority(&raw)?,
            None => ProviderKind::ALL.to_vec(),
        };
        let timeout_secs = parse_or(&lookup, "PROVIDER_TIMEOUT_SECS", DEFAULT_TIMEOUT.as_secs())?;
        if timeout_secs == 0 {
            return Err(anyhow!("value must be at least 1 second"))
                .context("PROVIDER_TIMEOUT_SECS has an invalid value '0'");
        }
        let timeout = Duration::from_secs(timeout_secs);
        let max_retries = parse_or(&lookup, "PROVIDER_MAX_RETRIES", DEFAULT_MAX_RETRIES)?;

        let mut providers = Vec::with_capacity(priority.len());
        let mut disabled_providers = Vec::new();
        for kind in priority {
            let Some(api_key) = non_blank(&lookup, kind.api_key_var()) else {
                disabled_providers.push(kind);
                continue;
            };

            let mut provider = ProviderConfig::new(kind, api_key)
                .with_timeout(timeout)
                .with_max_retries(max_retries);
            if let Some(endpoint) = non_blank(&lookup, kind.api_url_var()) {
                provider = provider.with_endpoint(endpoint);
            }
            providers.push(provider);
        }

        let backoff = Backoff {
            base_delay: Duration::from_millis(parse_or(
                &lookup,
                "RETRY_BASE_DELAY_MS",
                DEFAULT_BASE_DELAY.as_millis() as u64,
            )?),
            max_delay: Duration::from_millis(parse_or(
                &lookup,
                "RETRY_MAX_DELAY_MS",
                DEFAULT_MAX_DELAY.as_millis() as u64,
            )?),
        };

        Ok(Config {
            providers,
            disabled_providers,
            backoff,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: non_blank(&lookup, "RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Parses a comma-separated provider list. Duplicates keep their first position.
fn parse_priority(raw: &str) -> Result<Vec<ProviderKind>> {
    let mut order = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind: ProviderKind = name
            .parse()
            .map_err(|e: String| anyhow!(e))
            .context("PROVIDER_PRIORITY must list only kimi, openai or deepseek")?;
        if !order.contains(&kind) {
            order.push(kind);
        }
    }
    if order.is_empty() {
        return Err(anyhow!("no provider names in '{raw}'"))
            .context("PROVIDER_PRIORITY must list at least one provider");
    }
    Ok(order)
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_blank(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
