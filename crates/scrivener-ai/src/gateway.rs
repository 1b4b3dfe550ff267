//! HTTP gateway to an OpenAI-style chat-completions endpoint.
//!
//! One [`GatewayClient::call`] turns a prompt (plus optional prior turns) into
//! the model's reply text. Transport failures and non-success statuses are
//! retried with exponential backoff; a success status with an unreadable
//! envelope is terminal straight away.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scrivener_core::{ConversationTurn, GatewayConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 2000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("AI endpoint request failed: {message}")]
    Transport { message: String },
    #[error("AI endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },
    #[error("malformed completion envelope: {reason}")]
    MalformedEnvelope { reason: String },
}

impl GatewayError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Endpoint { .. })
    }

    /// HTTP status, when the endpoint answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Endpoint { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Body of one chat-completions request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ConversationTurn>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Status and body of an HTTP response, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request per call. Implementations report connection and timeout
/// problems as [`GatewayError::Transport`] and return every HTTP response,
/// whatever its status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: &ChatRequest) -> Result<RawResponse, GatewayError>;
}

/// [`Transport`] over `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.completions_url(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: &ChatRequest) -> Result<RawResponse, GatewayError> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport_error)?;
        Ok(RawResponse { status, body })
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport {
        message: err.to_string(),
    }
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a success body.
fn reply_text(body: &str) -> Result<String, GatewayError> {
    let completion: Completion =
        serde_json::from_str(body).map_err(|e| GatewayError::MalformedEnvelope {
            reason: e.to_string(),
        })?;
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::MalformedEnvelope {
            reason: "no choices in response".to_string(),
        })?;
    choice
        .message
        .content
        .ok_or_else(|| GatewayError::MalformedEnvelope {
            reason: "first choice has no message content".to_string(),
        })
}

/// Stateless client for the completions endpoint; cheap to clone and share.
#[derive(Clone)]
pub struct GatewayClient {
    config: Arc<GatewayConfig>,
    transport: Arc<dyn Transport>,
}

impl GatewayClient {
    /// Client that talks HTTP to `config.base_url`.
    pub fn new(config: Arc<GatewayConfig>) -> Self {
        let transport = Arc::new(HttpTransport::new(&config));
        Self { config, transport }
    }

    pub fn with_transport(config: Arc<GatewayConfig>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Prior turns in order, then the prompt as a final user turn.
    pub fn build_request(&self, prompt: &str, history: &[ConversationTurn]) -> ChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.extend_from_slice(history);
        messages.push(ConversationTurn::user(prompt));
        ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    /// Send `prompt` and return the model's reply text.
    ///
    /// Makes at most `max_retries` attempts. After failed attempt `n`
    /// (0-based) it waits `2^n * backoff_base` before trying again.
    pub async fn call(
        &self,
        prompt: &str,
        history: &[ConversationTurn],
    ) -> Result<String, GatewayError> {
        let request = self.build_request(prompt, history);
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0u32;

        loop {
            let err = match self.transport.post(&request).await {
                Ok(resp) if resp.is_success() => {
                    let content = reply_text(&resp.body)?;
                    debug!(
                        attempt = attempt + 1,
                        response_length = content.len(),
                        "AI service call successful"
                    );
                    return Ok(content);
                }
                Ok(resp) => GatewayError::Endpoint {
                    status: resp.status,
                    body: resp.body,
                },
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            warn!(
                attempt = attempt + 1,
                status = err.status(),
                error = %err,
                "AI service attempt failed"
            );
            if attempt + 1 >= max_attempts {
                error!(
                    attempts = max_attempts,
                    status = err.status(),
                    error = %err,
                    "AI service call failed after all retries"
                );
                return Err(err);
            }

            tokio::time::sleep(self.config.backoff_delay(attempt)).await;
            attempt += 1;
        }
    }
}
