//! Supported completion vendors and the wire details each one owns.
//!
//! Every vendor is a variant of [`ProviderKind`]. A variant knows its default
//! endpoint and sampling parameters, any extra request fields or headers it
//! needs, and how to turn a response body into completion text. Adding a
//! vendor means adding a variant here; nothing upstream branches on vendors.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Prompt, ProviderError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TOP_P: f32 = 0.9;

/// Longest slice of an unparseable body carried into error messages.
const ERROR_BODY_PREVIEW: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Kimi,
    OpenAi,
    Deepseek,
}

impl ProviderKind {
    /// Default auto-mode priority.
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Kimi, ProviderKind::OpenAi, ProviderKind::Deepseek];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Kimi => "kimi",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Deepseek => "deepseek",
        }
    }

    /// Environment variable holding the credential.
    pub fn api_key_var(self) -> &'static str {
        match self {
            ProviderKind::Kimi => "KIMI_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Deepseek => "DEEPSEEK_API_KEY",
        }
    }

    /// Environment variable overriding the endpoint URL.
    pub fn api_url_var(self) -> &'static str {
        match self {
            ProviderKind::Kimi => "KIMI_API_URL",
            ProviderKind::OpenAi => "OPENAI_API_URL",
            ProviderKind::Deepseek => "DEEPSEEK_API_URL",
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            ProviderKind::Kimi => "https://api.moonshot.cn/v1/chat/completions",
            ProviderKind::OpenAi => "https://api.openai.com/v1/chat/completions",
            ProviderKind::Deepseek => "https://api.deepseek.com/v1/chat/completions",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Kimi => "moonshot-v1-8k",
            ProviderKind::OpenAi => "gpt-3.5-turbo",
            ProviderKind::Deepseek => "deepseek-chat",
        }
    }

    pub fn default_temperature(self) -> f32 {
        match self {
            ProviderKind::Kimi => 0.3,
            ProviderKind::OpenAi | ProviderKind::Deepseek => 0.5,
        }
    }

    /// Headers sent in addition to auth and content type.
    pub fn extra_headers(self) -> &'static [(&'static str, &'static str)] {
        match self {
            ProviderKind::Kimi => &[("Accept", "application/json")],
            ProviderKind::OpenAi | ProviderKind::Deepseek => &[],
        }
    }

    /// Builds the JSON request body for one completion call.
    pub(crate) fn request_body<'a>(
        self,
        config: &'a ProviderConfig,
        prompt: &'a Prompt,
    ) -> ChatCompletionRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = prompt.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &prompt.user,
        });

        ChatCompletionRequest {
            model: &config.model,
            messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            // Kimi requests always carry an explicit non-streaming flag.
            stream: matches!(self, ProviderKind::Kimi).then_some(false),
        }
    }

    /// Extracts completion text from a successful response body.
    pub fn parse_completion(self, body: &str) -> Result<String, ProviderError> {
        match self {
            // All three vendors speak the OpenAI chat-completions dialect.
            ProviderKind::Kimi | ProviderKind::OpenAi | ProviderKind::Deepseek => {
                parse_chat_completion(self, body)
            }
        }
    }

    /// Pulls a human-readable message out of a non-2xx response body.
    pub fn parse_error_message(self, body: &str) -> String {
        match self {
            ProviderKind::Kimi | ProviderKind::OpenAi | ProviderKind::Deepseek => {
                parse_chat_error(body)
            }
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kimi" | "moonshot" => Ok(ProviderKind::Kimi),
            "openai" => Ok(ProviderKind::OpenAi),
            "deepseek" => Ok(ProviderKind::Deepseek),
            other => Err(format!("unsupported provider '{other}'")),
        }
    }
}

/// Connection and sampling settings for one vendor. Built once at startup.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub endpoint: String,
    pub api_key: SecretString,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    /// Total attempts allowed against this provider for one request.
    pub max_retries: u32,
}

impl ProviderConfig {
    /// A config with the vendor's defaults.
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            endpoint: kind.default_endpoint().to_string(),
            api_key: SecretString::from(api_key.into()),
            model: kind.default_model().to_string(),
            temperature: kind.default_temperature(),
            top_p: DEFAULT_TOP_P,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn summary(&self) -> ProviderSummary {
        ProviderSummary {
            name: self.kind,
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout.as_secs_f64(),
            max_retries: self.max_retries,
        }
    }
}

/// Public view of a provider config. Never includes the credential.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSummary {
    pub name: ProviderKind,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: f64,
    pub max_retries: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible chat completions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatErrorEnvelope {
    error: Option<ChatErrorBody>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorBody {
    message: String,
}

fn parse_chat_completion(kind: ProviderKind, body: &str) -> Result<String, ProviderError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("invalid JSON: {e}")))?;

    if let Some(usage) = &response.usage {
        debug!(
            provider = %kind,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "completion usage"
        );
    }

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::MalformedResponse("no message content in choices[0]".to_string()))?;

    if text.trim().is_empty() {
        return Err(ProviderError::MalformedResponse(
            "completion text is empty".to_string(),
        ));
    }

    Ok(text)
}

fn parse_chat_error(body: &str) -> String {
    match serde_json::from_str::<ChatErrorEnvelope>(body) {
        Ok(ChatErrorEnvelope {
            error: Some(error), ..
        }) => error.message,
        Ok(ChatErrorEnvelope {
            message: Some(message),
            ..
        }) => message,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.chars().take(ERROR_BODY_PREVIEW).collect(),
    }
}
