//! Core of the copy variant relay.
//!
//! A design-tool plugin sends a batch of text nodes plus a stylistic
//! profile. This crate turns them into a prompt, makes one chat-completion
//! call, and reshapes the model's JSON reply so that every node gets three
//! rewritten variants.
//!
//! ```text
//! (GenerationConfig, [TextNode])
//!     ── prompt::build_prompt ──▶ system + user messages
//!     ── CompletionClient::chat ──▶ raw reply text
//!     ── response::parse_response ──▶ GenerationResults
//! ```
//!
//! [`relay::Relay`] wires these together. The prompt builder and the reply
//! interpreter are pure; only [`CompletionClient`] does I/O.
//!
//! # Failure policy
//!
//! - Transport or provider errors, and empty replies, surface as
//!   [`RelayError`](relay::RelayError).
//! - A reply that arrives but is not the expected JSON never surfaces.
//!   It degrades to the identity fallback in [`response`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | Request and result types |
//! | [`prompt`] | System instruction and per-request prompt |
//! | [`response`] | Reply parsing, reconciliation, fallback |
//! | [`relay`] | One request end to end |
//! | [`trace`] | Request correlation ids |

pub mod model;
pub mod prompt;
pub mod relay;
pub mod response;
pub mod trace;

pub use model::{
    GenerateRequest, GenerationConfig, GenerationResults, LengthConstraint, TextNode,
    VariantResult,
};
pub use prompt::{build_prompt, system_instruction};
pub use relay::{Relay, RelayError, RelaySettings};
pub use response::parse_response;

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// ── Constants ──────────────────────────────────────────────────────

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature for variant generation.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ── Request types ──────────────────────────────────────────────────

/// Chat-completion request body.
#[derive(Serialize, Debug, Default)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ResponseFormatType {
    #[serde(rename = "json_object")]
    JsonObject,
}

/// Output format directive.
#[derive(Serialize, Debug)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub fmt_type: ResponseFormatType,
}

impl ResponseFormat {
    /// Require the reply to be a single JSON object.
    pub fn json_object() -> Self {
        Self {
            fmt_type: ResponseFormatType::JsonObject,
        }
    }
}

// ── Message types ──────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from [`CompletionClient::chat`].
#[derive(Debug, Default)]
pub struct ChatCompletion {
    /// Text of the first choice. `None` when the provider sent no choice
    /// or no content.
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

impl ChatCompletion {
    /// Whether the provider stopped at its token limit. A cut-off reply is
    /// rarely valid JSON.
    pub fn truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }

    pub fn total_tokens(&self) -> u32 {
        self.usage
            .as_ref()
            .and_then(|u| u.total_tokens)
            .unwrap_or(0)
    }
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct CompletionClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl CompletionClient {
    /// Create a client for the OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, String> {
        Self::with_endpoint(api_key, OPENAI_CHAT_URL)
    }

    /// Create a client that posts to a custom URL (gateways, local stubs).
    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("variant-relay/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, String> {
        debug!(
            "LLM request: model={}, messages={}, temp={}",
            body.model,
            body.messages.len(),
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(format!("completion API HTTP {status}: {text}"));
        }

        let parsed: RawChatResponse =
            serde_json::from_str(&text).map_err(|e| format!("failed to parse response: {e}"))?;

        if let Some(err) = parsed.error {
            return Err(format!("completion API error: {}", err.message));
        }

        if let Some(ref usage) = parsed.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
                usage.total_tokens.unwrap_or(0),
            );
        }

        match parsed.choices.and_then(|c| c.into_iter().next()) {
            Some(c) => {
                debug!(
                    "LLM output: {} chars, finish_reason={}",
                    c.message.content.as_ref().map_or(0, |s| s.len()),
                    c.finish_reason.as_deref().unwrap_or("-"),
                );
                Ok(ChatCompletion {
                    content: c.message.content,
                    usage: parsed.usage,
                    finish_reason: c.finish_reason,
                })
            }
            None => {
                debug!("LLM output: empty (no choices)");
                Ok(ChatCompletion {
                    usage: parsed.usage,
                    ..Default::default()
                })
            }
        }
    }
}
