//! Integration tests for `Analyzer` against a wiremock analysis server.

use std::time::Duration;

use brandscope_client::analyzer::{PAYLOAD_TOO_LARGE_MESSAGE, TIMEOUT_MESSAGE};
use brandscope_client::error::{CONNECTIVITY_MESSAGE, NO_BODY_MESSAGE};
use brandscope_client::{AnalysisState, Analyzer, ReportSink};
use brandscope_core::{BrandReport, PlatformEntry, ProtocolEvent};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn platforms() -> Vec<PlatformEntry> {
    vec![
        PlatformEntry::new("website", "https://example.com", true),
        PlatformEntry::new("instagram", "https://instagram.com/example", false),
    ]
}

fn sample_report() -> BrandReport {
    serde_json::from_value(serde_json::json!({
        "summary": {
            "overallScore": 72,
            "headline": "Mostly consistent",
            "keyFindings": ["Bio differs on Instagram"]
        },
        "consistency": {
            "score": 68,
            "analysis": "Names match, bios drift.",
            "mismatches": [{
                "field": "bio",
                "platforms": ["website", "instagram"],
                "description": "Different taglines",
                "severity": "medium"
            }]
        },
        "completeness": {"score": 80, "analysis": "Good coverage.", "gaps": []},
        "actionItems": [{
            "priority": 1,
            "title": "Align bios",
            "description": "Use one tagline everywhere",
            "platforms": ["instagram"]
        }]
    }))
    .expect("sample report should deserialize")
}

fn sse(events: &[ProtocolEvent]) -> String {
    let mut body: String = events
        .iter()
        .map(|e| e.to_frame().expect("frame"))
        .collect();
    body.push_str("data: [DONE]\n\n");
    body
}

async fn mount_stream(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/api/v1/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

fn analyzer(server: &MockServer) -> Analyzer {
    Analyzer::new(&server.uri(), 5).expect("analyzer construction should not fail")
}

#[tokio::test]
async fn text_only_stream_accumulates_preview() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analyze"))
        .and(body_partial_json(serde_json::json!({
            "platforms": [{"platformId": "website", "url": "https://example.com"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[ProtocolEvent::text("Hello "), ProtocolEvent::text("world")]),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let state = analyzer(&server).analyze(&platforms()).await;

    assert_eq!(
        state,
        AnalysisState {
            streaming_text: "Hello world".to_string(),
            report: None,
            is_analyzing: false,
            error: None,
        }
    );
}

#[tokio::test]
async fn report_event_is_stored() {
    let server = MockServer::start().await;
    let report = sample_report();
    mount_stream(
        &server,
        sse(&[
            ProtocolEvent::text("{\"summary\":"),
            ProtocolEvent::report(report.clone()),
        ]),
    )
    .await;

    let state = analyzer(&server).analyze(&platforms()).await;

    assert_eq!(state.report, Some(report));
    assert!(state.error.is_none());
    assert!(!state.is_analyzing);
    assert_eq!(state.streaming_text, "{\"summary\":");
}

#[tokio::test]
async fn error_event_is_stored() {
    let server = MockServer::start().await;
    mount_stream(&server, sse(&[ProtocolEvent::error("Parse failed")])).await;

    let state = analyzer(&server).analyze(&platforms()).await;

    assert_eq!(state.error.as_deref(), Some("Parse failed"));
    assert!(state.report.is_none());
    assert!(!state.is_analyzing);
}

#[tokio::test]
async fn unparseable_error_body_falls_back_to_status_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analyze"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let state = analyzer(&server).analyze(&platforms()).await;

    assert_eq!(state.error.as_deref(), Some("HTTP 503"));
    assert!(!state.is_analyzing);
}

#[tokio::test]
async fn structured_error_body_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analyze"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": "validation_error", "message": "platforms must not be empty"},
            "meta": {"request_id": "abc", "timestamp": "2026-01-01T00:00:00Z"}
        })))
        .mount(&server)
        .await;

    let state = analyzer(&server).analyze(&[]).await;

    assert_eq!(state.error.as_deref(), Some("platforms must not be empty"));
}

#[tokio::test]
async fn gateway_timeout_and_payload_too_large_get_friendly_messages() {
    for (status, expected) in [(504, TIMEOUT_MESSAGE), (413, PAYLOAD_TOO_LARGE_MESSAGE)] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/analyze"))
            .respond_with(ResponseTemplate::new(status).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let state = analyzer(&server).analyze(&platforms()).await;
        assert_eq!(state.error.as_deref(), Some(expected), "status {status}");
    }
}

#[tokio::test]
async fn empty_success_body_reports_no_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analyze"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let state = analyzer(&server).analyze(&platforms()).await;

    assert_eq!(state.error.as_deref(), Some(NO_BODY_MESSAGE));
    assert!(!state.is_analyzing);
}

#[tokio::test]
async fn unreachable_server_reports_connectivity_message() {
    let analyzer = Analyzer::new("http://127.0.0.1:1", 2).expect("analyzer");

    let state = analyzer.analyze(&platforms()).await;

    assert_eq!(state.error.as_deref(), Some(CONNECTIVITY_MESSAGE));
    assert!(!state.is_analyzing);
}

#[tokio::test]
async fn second_call_clears_stale_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analyze"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_stream(&server, sse(&[ProtocolEvent::text("fresh")])).await;

    let analyzer = analyzer(&server);
    let first = analyzer.analyze(&platforms()).await;
    assert_eq!(first.error.as_deref(), Some("HTTP 503"));

    let second = analyzer.analyze(&platforms()).await;
    assert!(second.error.is_none());
    assert_eq!(second.streaming_text, "fresh");
}

#[tokio::test]
async fn malformed_frame_is_skipped() {
    let server = MockServer::start().await;
    let body = format!(
        "{}data: {{not json\n\n{}data: [DONE]\n\n",
        ProtocolEvent::text("a").to_frame().expect("frame"),
        ProtocolEvent::text("b").to_frame().expect("frame"),
    );
    mount_stream(&server, body).await;

    let state = analyzer(&server).analyze(&platforms()).await;

    assert_eq!(state.streaming_text, "ab");
    assert!(state.error.is_none());
}

#[tokio::test]
async fn frames_after_done_are_ignored() {
    let server = MockServer::start().await;
    let mut body = sse(&[ProtocolEvent::text("kept")]);
    body.push_str(&ProtocolEvent::error("late").to_frame().expect("frame"));
    mount_stream(&server, body).await;

    let state = analyzer(&server).analyze(&platforms()).await;

    assert_eq!(state.streaming_text, "kept");
    assert!(state.error.is_none());
}

#[tokio::test]
async fn subscribers_observe_final_state() {
    let server = MockServer::start().await;
    mount_stream(&server, sse(&[ProtocolEvent::text("x")])).await;

    let analyzer = analyzer(&server);
    let rx = analyzer.subscribe();
    let state = analyzer.analyze(&platforms()).await;

    assert_eq!(*rx.borrow(), state);
    assert_eq!(analyzer.state(), state);
}

#[tokio::test]
async fn overlapping_calls_keep_separate_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analyze"))
        .and(body_partial_json(serde_json::json!({"platforms": [{"platformId": "slow"}]})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse(&[ProtocolEvent::text("AAA")]), "text/event-stream")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analyze"))
        .and(body_partial_json(serde_json::json!({"platforms": [{"platformId": "fast"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse(&[ProtocolEvent::error("B failed")]),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let analyzer = analyzer(&server);
    let slow = [PlatformEntry::new("slow", "https://slow.example.com", true)];
    let fast = [PlatformEntry::new("fast", "https://fast.example.com", true)];
    let (first, second) = tokio::join!(analyzer.analyze(&slow), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        analyzer.analyze(&fast).await
    });

    assert_eq!(
        first,
        AnalysisState {
            streaming_text: "AAA".to_string(),
            report: None,
            is_analyzing: false,
            error: None,
        }
    );
    assert_eq!(second.error.as_deref(), Some("B failed"));
    assert!(second.streaming_text.is_empty());
    assert!(!second.is_analyzing);
    assert_eq!(analyzer.state(), first, "the slower call published last");
}

async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<wiremock::Request> {
    for _ in 0..50 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    server.received_requests().await.unwrap_or_default()
}

#[tokio::test]
async fn report_is_forwarded_to_sink() {
    let server = MockServer::start().await;
    let sink_server = MockServer::start().await;
    let report = sample_report();
    mount_stream(&server, sse(&[ProtocolEvent::report(report.clone())])).await;
    Mock::given(method("POST"))
        .and(path("/reports"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&sink_server)
        .await;

    let sink = ReportSink::new(format!("{}/reports", sink_server.uri()), 5).expect("sink");
    let state = analyzer(&server)
        .with_report_sink(sink)
        .analyze(&platforms())
        .await;
    assert_eq!(state.report.as_ref(), Some(&report));

    let received = wait_for_requests(&sink_server, 1).await;
    assert_eq!(received.len(), 1);
    let payload: serde_json::Value =
        serde_json::from_slice(&received[0].body).expect("sink body is JSON");
    assert_eq!(payload["report"]["summary"]["overallScore"], 72);
    assert_eq!(payload["platforms"][1]["platformId"], "instagram");
    assert!(payload["platforms"][0].get("screenshots").is_none());
}

#[tokio::test]
async fn failing_sink_does_not_alter_state() {
    let server = MockServer::start().await;
    let sink_server = MockServer::start().await;
    let report = sample_report();
    mount_stream(&server, sse(&[ProtocolEvent::report(report.clone())])).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&sink_server)
        .await;

    let sink = ReportSink::new(sink_server.uri(), 5).expect("sink");
    let analyzer = analyzer(&server).with_report_sink(sink);
    let state = analyzer.analyze(&platforms()).await;

    wait_for_requests(&sink_server, 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(state.report, Some(report));
    assert!(state.error.is_none());
    assert_eq!(analyzer.state(), state);
}

#[tokio::test]
async fn sink_delivery_error_is_returned_when_awaited_directly() {
    let sink_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&sink_server)
        .await;

    let sink = ReportSink::new(sink_server.uri(), 5).expect("sink");
    let result = sink.deliver(&sample_report(), &platforms()).await;
    assert!(result.is_err());
}
