//! One generation request end to end.
//!
//! [`Relay`] owns the completion client and the model settings. It is
//! immutable after construction, so a single instance can be shared behind
//! an `Arc` by every concurrent request.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{GenerationConfig, GenerationResults, TextNode};
use crate::prompt::{build_prompt, system_instruction};
use crate::response::parse_response;
use crate::{
    ChatRequest, CompletionClient, DEFAULT_MODEL, DEFAULT_TEMPERATURE, Message, ResponseFormat,
};

/// Failures that abort a request instead of degrading to the fallback.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Network, HTTP status, or provider-reported failure.
    #[error("{0}")]
    Upstream(String),
    /// The call succeeded but carried no text.
    #[error("Empty response from completion API")]
    EmptyReply,
}

/// Model parameters for the upstream call.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,
    /// Sampling temperature. Default: [`DEFAULT_TEMPERATURE`].
    pub temperature: f32,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl RelaySettings {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

pub struct Relay {
    client: CompletionClient,
    settings: RelaySettings,
}

impl Relay {
    pub fn new(client: CompletionClient, settings: RelaySettings) -> Self {
        Self { client, settings }
    }

    /// The request body sent upstream for this batch: exactly a system and a
    /// user message, JSON object output.
    pub fn chat_request(&self, config: &GenerationConfig, nodes: &[TextNode]) -> ChatRequest {
        ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![
                Message::system(system_instruction()),
                Message::user(build_prompt(config, nodes)),
            ],
            temperature: self.settings.temperature,
            response_format: Some(ResponseFormat::json_object()),
        }
    }

    /// Generate variants for `nodes`.
    ///
    /// Returns an error only when the upstream call fails or its reply is
    /// empty. Malformed replies come back as fallback results.
    pub async fn generate(
        &self,
        config: &GenerationConfig,
        nodes: &[TextNode],
    ) -> Result<GenerationResults, RelayError> {
        let body = self.chat_request(config, nodes);
        debug!(
            "prompt for {} node(s): {} chars",
            nodes.len(),
            body.messages[1].content.len()
        );

        let completion = self
            .client
            .chat(&body)
            .await
            .map_err(RelayError::Upstream)?;

        if completion.truncated() {
            warn!("reply hit the token limit; expect fallback variants");
        }
        let total_tokens = completion.total_tokens();

        let content = completion
            .content
            .filter(|c| !c.is_empty())
            .ok_or(RelayError::EmptyReply)?;

        let results = parse_response(&content, nodes);
        info!(
            "generated {} variant set(s) for {} node(s), {} tokens",
            results.variants.len(),
            nodes.len(),
            total_tokens
        );
        Ok(results)
    }
}
