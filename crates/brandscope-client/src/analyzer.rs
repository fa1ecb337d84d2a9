//! Drives one analysis request against the server and folds its event stream
//! into [`AnalysisState`].

use std::time::Duration;

use brandscope_core::sse::{data_lines, FrameBuffer};
use brandscope_core::{ClientConfig, PlatformEntry, ProtocolEvent};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::ClientError;
use crate::sink::ReportSink;
use crate::state::AnalysisState;

const ANALYZE_PATH: &str = "/api/v1/analyze";
const SINK_TIMEOUT_SECS: u64 = 30;

pub const TIMEOUT_MESSAGE: &str =
    "The analysis timed out. Try again with fewer platforms or screenshots.";
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str =
    "The request is too large. Remove some screenshots and try again.";

#[derive(Debug, Serialize)]
struct AnalyzeBody<'a> {
    platforms: &'a [PlatformEntry],
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    Nested { error: ErrorDetail },
    Flat { error: String },
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Client for `POST /api/v1/analyze`.
///
/// Every `analyze` call folds its events into its own [`AnalysisState`] and
/// returns it. Each change is also published through a `watch` channel so
/// subscribers see preview text while the model is still writing; with
/// overlapping calls the channel shows whichever call changed last.
#[derive(Debug)]
pub struct Analyzer {
    client: reqwest::Client,
    endpoint: String,
    sink: Option<ReportSink>,
    state: watch::Sender<AnalysisState>,
}

impl Analyzer {
    /// Builds an analyzer from client configuration, attaching a report sink
    /// when one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if an HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let analyzer = Self::new(&config.server_url, config.request_timeout_secs)?;
        match &config.report_sink_url {
            Some(url) => Ok(analyzer.with_report_sink(ReportSink::new(url.clone(), SINK_TIMEOUT_SECS)?)),
            None => Ok(analyzer),
        }
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(server_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{ANALYZE_PATH}", server_url.trim_end_matches('/')),
            sink: None,
            state: watch::Sender::new(AnalysisState::default()),
        })
    }

    #[must_use]
    pub fn with_report_sink(mut self, sink: ReportSink) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.state.subscribe()
    }

    /// Most recently published snapshot.
    #[must_use]
    pub fn state(&self) -> AnalysisState {
        self.state.borrow().clone()
    }

    /// Runs one analysis to completion and returns the final state.
    ///
    /// Never fails: every failure ends up in [`AnalysisState::error`], and
    /// `is_analyzing` is `false` on return regardless of outcome.
    pub async fn analyze(&self, platforms: &[PlatformEntry]) -> AnalysisState {
        let mut state = AnalysisState::default();
        state.reset();
        self.publish(&state);

        if let Err(e) = self.stream(platforms, &mut state).await {
            tracing::warn!(error = %e, "analysis request failed");
            state.on_error(e.user_message());
        }

        state.on_done();
        self.publish(&state);
        state
    }

    fn publish(&self, state: &AnalysisState) {
        self.state.send_replace(state.clone());
    }

    async fn stream(
        &self,
        platforms: &[PlatformEntry],
        state: &mut AnalysisState,
    ) -> Result<(), ClientError> {
        let mut response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeBody { platforms })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        if response.content_length() == Some(0) {
            return Err(ClientError::NoBody);
        }

        let mut frames = FrameBuffer::new();
        while let Some(chunk) = response.chunk().await? {
            for frame in frames.push(&chunk) {
                if self.dispatch(&frame, platforms, state) == Flow::Stop {
                    return Ok(());
                }
            }
        }
        if let Some(frame) = frames.finish() {
            self.dispatch(&frame, platforms, state);
        }
        Ok(())
    }

    fn dispatch(
        &self,
        frame: &str,
        platforms: &[PlatformEntry],
        state: &mut AnalysisState,
    ) -> Flow {
        for payload in data_lines(frame) {
            match ProtocolEvent::parse_data(payload) {
                Ok(None) => return Flow::Stop,
                Ok(Some(ProtocolEvent::ReportReady { report })) => {
                    if let Some(sink) = &self.sink {
                        sink.notify((*report).clone(), platforms.to_vec());
                    }
                    state.on_report(*report);
                    self.publish(state);
                }
                Ok(Some(event)) => {
                    state.apply(event);
                    self.publish(state);
                }
                Err(e) => {
                    tracing::warn!(error = %e, payload, "skipping malformed stream frame");
                }
            }
        }
        Flow::Continue
    }
}

/// User-facing message for a non-2xx response.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorPayload>(body) {
        Ok(ErrorPayload::Nested { error }) if !error.message.is_empty() => error.message,
        Ok(ErrorPayload::Flat { error }) if !error.is_empty() => error,
        _ => match status {
            StatusCode::GATEWAY_TIMEOUT => TIMEOUT_MESSAGE.to_string(),
            StatusCode::PAYLOAD_TOO_LARGE => PAYLOAD_TOO_LARGE_MESSAGE.to_string(),
            other => format!("HTTP {}", other.as_u16()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_error_message_is_preferred() {
        let body = r#"{"error":{"code":"validation_error","message":"platforms must not be empty"}}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "platforms must not be empty"
        );
    }

    #[test]
    fn flat_error_string_is_accepted() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, r#"{"error":"upstream down"}"#),
            "upstream down"
        );
    }

    #[test]
    fn status_fallbacks() {
        assert_eq!(error_message(StatusCode::GATEWAY_TIMEOUT, ""), TIMEOUT_MESSAGE);
        assert_eq!(
            error_message(StatusCode::PAYLOAD_TOO_LARGE, "<html>too big</html>"),
            PAYLOAD_TOO_LARGE_MESSAGE
        );
        assert_eq!(
            error_message(StatusCode::SERVICE_UNAVAILABLE, "not json"),
            "HTTP 503"
        );
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let analyzer = Analyzer::new("http://localhost:3000/", 5).expect("client");
        assert_eq!(analyzer.endpoint(), "http://localhost:3000/api/v1/analyze");
    }
}
