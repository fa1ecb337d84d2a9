//! Streaming client for the Anthropic Messages API.
//!
//! Only the pieces the analysis needs are modelled: one user message made of
//! content blocks, and the `text_delta` events of the streamed answer.

use std::collections::VecDeque;
use std::time::Duration;

use brandscope_core::sse::{self, FrameBuffer};
use brandscope_core::{AppConfig, ContentBlock};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

const API_VERSION: &str = "2023-06-01";

/// Client for the Messages API in streaming mode.
///
/// Use [`AnthropicClient::from_config`] in the server or
/// [`AnthropicClient::with_base_url`] to point at a mock server in tests.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    messages_url: Url,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    stream: bool,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a [ContentBlock],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    ContentBlockDelta { delta: Delta },
    MessageStop,
    Error { error: ErrorDetail },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

impl AnthropicClient {
    /// Creates a client from server configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`AnalysisError::InvalidBaseUrl`] for a bad upstream URL.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnalysisError> {
        Self::with_base_url(
            &config.anthropic_api_key,
            &config.model,
            config.max_tokens,
            config.upstream_timeout_secs,
            &config.upstream_url,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`AnalysisError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        max_tokens: u32,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("brandscope/0.1 (presence-analysis)")
            .build()?;

        let normalised = format!("{}/v1/messages", base_url.trim_end_matches('/'));
        let messages_url = Url::parse(&normalised).map_err(|e| AnalysisError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            max_tokens,
            messages_url,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Opens a streaming completion with `blocks` as the only user message.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Http`] on network failure.
    /// - [`AnalysisError::Upstream`] on a non-2xx status, carrying the
    ///   provider's error message when the body has one.
    pub async fn open_stream(
        &self,
        system: &str,
        blocks: &[ContentBlock],
    ) -> Result<UpstreamStream, AnalysisError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            stream: true,
            messages: [UserMessage {
                role: "user",
                content: blocks,
            }],
        };

        let response = self
            .client
            .post(self.messages_url.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .map(|env| env.error.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "request rejected".to_string());
            return Err(AnalysisError::Upstream(format!(
                "HTTP {}: {message}",
                status.as_u16()
            )));
        }

        Ok(UpstreamStream {
            response,
            frames: FrameBuffer::new(),
            pending: VecDeque::new(),
            finished: false,
        })
    }
}

/// Text deltas of one streamed completion, in arrival order.
pub struct UpstreamStream {
    response: reqwest::Response,
    frames: FrameBuffer,
    pending: VecDeque<Result<String, AnalysisError>>,
    finished: bool,
}

impl UpstreamStream {
    /// Next text delta, `None` once the message has stopped or the body ended.
    ///
    /// An error is yielded at most once and ends the stream.
    pub async fn next_delta(&mut self) -> Option<Result<String, AnalysisError>> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            if self.finished {
                return None;
            }

            match self.response.chunk().await {
                Ok(Some(chunk)) => {
                    for frame in self.frames.push(&chunk) {
                        self.handle_frame(&frame);
                        if self.finished {
                            break;
                        }
                    }
                }
                Ok(None) => {
                    if let Some(frame) = self.frames.finish() {
                        self.handle_frame(&frame);
                    }
                    self.finished = true;
                }
                Err(e) => {
                    self.pending.push_back(Err(AnalysisError::Http(e)));
                    self.finished = true;
                }
            }
        }
    }

    fn handle_frame(&mut self, frame: &str) {
        for payload in sse::data_lines(frame) {
            let event = match serde_json::from_str::<StreamEvent>(payload) {
                Ok(event) => event,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unparseable upstream event");
                    continue;
                }
            };
            match event {
                StreamEvent::ContentBlockDelta {
                    delta: Delta::TextDelta { text },
                } => {
                    if !text.is_empty() {
                        self.pending.push_back(Ok(text));
                    }
                }
                StreamEvent::MessageStop => {
                    self.finished = true;
                    return;
                }
                StreamEvent::Error { error } => {
                    self.pending
                        .push_back(Err(AnalysisError::Upstream(error.message)));
                    self.finished = true;
                    return;
                }
                StreamEvent::ContentBlockDelta { .. } | StreamEvent::Other => {}
            }
        }
    }
}
