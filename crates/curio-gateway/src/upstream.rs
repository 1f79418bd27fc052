//! Chat-completions client for the upstream text-generation service.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GatewayError, Result};

/// Something that turns a system + user message pair into generated text.
///
/// The production implementation is [`UpstreamClient`]; tests substitute
/// canned backends.
#[async_trait]
pub trait CompletionBackend: Send + Sync + fmt::Debug {
    /// Sends one completion request and returns the raw generated text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if present and non-blank.
    fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

// ============================================================================
// UpstreamClient
// ============================================================================

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: String,
}

impl fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl UpstreamClient {
    /// Creates a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        api_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url: api_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// The endpoint this client posts to.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// The model name sent with each request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionBackend for UpstreamClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        debug!(url = %self.api_url, model = %self.model, "Sending completion request");

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Upstream returned an error status");
            return Err(GatewayError::upstream(status.as_u16(), body));
        }

        let text = response.text().await?;
        let envelope: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| GatewayError::InvalidEnvelope(e.to_string()))?;

        let content = envelope.into_content().ok_or(GatewayError::EmptyContent)?;
        debug!(content_len = content.len(), "Received completion");
        Ok(content)
    }
}
