//! `POST /api/v1/analyze`: the streaming proxy between clients and the model.
//!
//! Request validation happens up front and fails with a normal JSON error.
//! Once the event stream is open the status is already committed as 200, so
//! every later failure (upstream or report validation) travels in-band as an
//! `error` event. Every stream ends with exactly one `[DONE]`.

use std::convert::Infallible;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    Extension, Json,
};
use brandscope_analysis::{
    build_content_blocks, parse_report, AnalysisError, AnthropicClient, BudgetCheck, SYSTEM_PROMPT,
};
use brandscope_core::{BrandReport, ContentBlock, PlatformEntry, ProtocolEvent};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};

use crate::middleware::RequestId;

use super::{ApiError, AppState, RequestLimits};

/// Events buffered between the upstream reader and the HTTP body.
const EVENT_BUFFER: usize = 64;

const ALLOWED_MEDIA_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    pub platforms: Vec<PlatformEntry>,
}

pub(super) async fn analyze(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let rid = req_id.0;
    let Json(body) = payload.map_err(|rejection| map_rejection(&rid, &rejection))?;
    validate_platforms(&rid, &body.platforms, &state.limits)?;

    match state.limits.token_budget.check(&body.platforms) {
        BudgetCheck::Exceeded { estimate, limit } => tracing::warn!(
            request_id = %rid,
            estimate,
            limit,
            "prompt estimate exceeds token budget; sending anyway"
        ),
        BudgetCheck::Within { estimate, .. } => {
            tracing::debug!(request_id = %rid, estimate, "prompt estimate within budget");
        }
    }

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    tokio::spawn(run_analysis(state.model.clone(), body.platforms, tx, rid));

    let stream = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(to_sse_event(&event)));
    Ok(Sse::new(stream))
}

fn map_rejection(rid: &str, rejection: &JsonRejection) -> ApiError {
    let code = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "unsupported_media_type",
        StatusCode::UNPROCESSABLE_ENTITY => "unprocessable_entity",
        _ => "bad_request",
    };
    ApiError::new(rid, code, rejection.body_text())
}

fn validate_platforms(
    rid: &str,
    platforms: &[PlatformEntry],
    limits: &RequestLimits,
) -> Result<(), ApiError> {
    if platforms.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "at least one platform is required",
        ));
    }
    if platforms.len() > limits.max_platforms {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!(
                "at most {} platforms can be analyzed at once, got {}",
                limits.max_platforms,
                platforms.len()
            ),
        ));
    }

    for (idx, entry) in platforms.iter().enumerate() {
        if entry.platform_id.trim().is_empty() {
            return Err(ApiError::new(
                rid,
                "validation_error",
                format!("platforms[{idx}].platformId must not be empty"),
            ));
        }
        if entry.url.trim().is_empty() {
            return Err(ApiError::new(
                rid,
                "validation_error",
                format!("platforms[{idx}].url must not be empty"),
            ));
        }
        for (shot_idx, shot) in entry.screenshots.iter().enumerate() {
            if !ALLOWED_MEDIA_TYPES.contains(&shot.media_type.as_str()) {
                return Err(ApiError::new(
                    rid,
                    "validation_error",
                    format!(
                        "platforms[{idx}].screenshots[{shot_idx}].mediaType must be one of {}, got '{}'",
                        ALLOWED_MEDIA_TYPES.join(", "),
                        shot.media_type
                    ),
                ));
            }
            if shot.base64.trim().is_empty() {
                return Err(ApiError::new(
                    rid,
                    "validation_error",
                    format!("platforms[{idx}].screenshots[{shot_idx}].base64 must not be empty"),
                ));
            }
        }
    }
    Ok(())
}

fn to_sse_event(event: &ProtocolEvent) -> Event {
    let data = event.to_sse_data().unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to encode protocol event");
        r#"{"type":"error","error":"failed to encode analysis event"}"#.to_string()
    });
    Event::default().data(data)
}

/// Forwards events to the response body while tracking whether anyone is
/// still reading it.
struct EventSink {
    tx: mpsc::Sender<ProtocolEvent>,
    client_gone: bool,
    request_id: String,
}

impl EventSink {
    async fn send(&mut self, event: ProtocolEvent) {
        if self.client_gone {
            return;
        }
        if self.tx.send(event).await.is_err() {
            // Upstream keeps running to completion; only delivery stops.
            self.client_gone = true;
            tracing::info!(
                request_id = %self.request_id,
                "client disconnected mid-stream; finishing upstream call unread"
            );
        }
    }
}

/// Drives one analysis from upstream call to terminal `[DONE]`.
pub(super) async fn run_analysis(
    model: AnthropicClient,
    entries: Vec<PlatformEntry>,
    tx: mpsc::Sender<ProtocolEvent>,
    request_id: String,
) {
    let mut sink = EventSink {
        tx,
        client_gone: false,
        request_id,
    };
    let blocks = build_content_blocks(&entries);
    tracing::info!(
        request_id = %sink.request_id,
        platforms = entries.len(),
        blocks = blocks.len(),
        "starting analysis"
    );

    match stream_and_validate(&model, &blocks, &mut sink).await {
        Ok(report) => {
            tracing::info!(
                request_id = %sink.request_id,
                overall_score = report.summary.overall_score,
                "analysis produced a valid report"
            );
            sink.send(ProtocolEvent::report(report)).await;
        }
        Err(e) => {
            tracing::warn!(request_id = %sink.request_id, error = %e, "analysis failed");
            sink.send(ProtocolEvent::error(e.to_string())).await;
        }
    }

    sink.send(ProtocolEvent::Done).await;
}

async fn stream_and_validate(
    model: &AnthropicClient,
    blocks: &[ContentBlock],
    sink: &mut EventSink,
) -> Result<BrandReport, AnalysisError> {
    let mut upstream = model.open_stream(SYSTEM_PROMPT, blocks).await?;
    let mut full_text = String::new();

    while let Some(delta) = upstream.next_delta().await {
        let text = delta?;
        full_text.push_str(&text);
        sink.send(ProtocolEvent::text(text)).await;
    }

    tracing::debug!(
        request_id = %sink.request_id,
        chars = full_text.len(),
        "upstream stream complete; validating report"
    );
    Ok(parse_report(&full_text)?)
}

#[cfg(test)]
#[path = "analyze_test.rs"]
mod tests;
