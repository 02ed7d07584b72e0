//! Wrapped tool behavior: event sequencing, results passthrough, error
//! handling and metadata extraction, against an in-memory transport.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::{sync::Arc, time::Duration};

use serde_json::json;
use toolsight::{Config, DeliveryError, EventType, Metadata, Tracker, WrapOptions};
use toolsight_testing::{RecordingTransport, TestClock};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("tool failed: {0}")]
struct ToolError(String);

fn tracker(transport: &RecordingTransport, clock: &TestClock) -> Tracker {
    Tracker::with_transport(&Config::new("tk_test"), Arc::new(transport.clone()))
        .with_clock(Arc::new(clock.clone()))
}

fn metadata(entries: &[(&str, serde_json::Value)]) -> Metadata {
    entries.iter().map(|(key, value)| (key.to_string(), value.clone())).collect()
}

#[tokio::test]
async fn success_returns_result_and_tracks_twice() {
    let transport = RecordingTransport::accepting();
    let clock = TestClock::new();
    let tool_clock = clock.clone();
    let search = tracker(&transport, &clock).wrap(
        "web_search",
        move |query: String, _meta: Option<()>| {
            let clock = tool_clock.clone();
            async move {
                clock.advance(Duration::from_millis(120));
                Ok::<_, ToolError>(vec![format!("{query}: 3 hits")])
            }
        },
        WrapOptions::new(),
    );

    let result = search.call("rust".to_string(), None).await;

    assert_eq!(result, Ok(vec!["rust: 3 hits".to_string()]));
    assert_eq!(transport.event_types().await, vec![EventType::Invocation, EventType::Success]);

    let payloads = transport.payloads().await;
    assert!(payloads.iter().all(|payload| payload.tool_name == "web_search"));
    assert_eq!(payloads[0].duration_ms, None);
    assert_eq!(payloads[1].duration_ms, Some(120));
}

#[tokio::test]
async fn failure_is_tracked_and_rethrown() {
    let transport = RecordingTransport::accepting();
    let clock = TestClock::new();
    let fetch = tracker(&transport, &clock).wrap(
        "fetch_page",
        |_url: String, _meta: Option<()>| async move {
            Err::<String, _>(ToolError("404 from origin".to_string()))
        },
        WrapOptions::new(),
    );

    let result = fetch.call("https://example.test".to_string(), None).await;

    assert_eq!(result, Err(ToolError("404 from origin".to_string())));
    assert_eq!(transport.event_types().await, vec![EventType::Invocation, EventType::Failure]);
    assert_eq!(transport.payloads().await[1].duration_ms, Some(0));
}

#[tokio::test]
async fn swallowed_failure_returns_default() {
    let transport = RecordingTransport::accepting();
    let clock = TestClock::new();
    let fetch = tracker(&transport, &clock).wrap(
        "fetch_page",
        |_url: String, _meta: Option<()>| async move {
            Err::<Vec<String>, _>(ToolError("boom".to_string()))
        },
        WrapOptions::new().rethrow_errors(false),
    );

    let result = fetch.call("https://example.test".to_string(), None).await;

    assert_eq!(result, Ok(Vec::new()));
    assert_eq!(transport.event_types().await, vec![EventType::Invocation, EventType::Failure]);
}

#[tokio::test]
async fn invocation_tracking_can_be_disabled() {
    let transport = RecordingTransport::accepting();
    let clock = TestClock::new();
    let add = tracker(&transport, &clock).wrap(
        "add",
        |(a, b): (i64, i64), _meta: Option<()>| async move { Ok::<_, ToolError>(a + b) },
        WrapOptions::new().track_invocation(false),
    );

    assert_eq!(add.call((2, 3), None).await, Ok(5));
    assert_eq!(transport.event_types().await, vec![EventType::Success]);
}

#[tokio::test]
async fn invocation_is_delivered_before_tool_runs() {
    let transport = RecordingTransport::accepting();
    let clock = TestClock::new();
    let observed = transport.clone();
    let probe = tracker(&transport, &clock).wrap(
        "probe",
        move |_: (), _meta: Option<()>| {
            let observed = observed.clone();
            async move { Ok::<_, ToolError>(observed.event_types().await) }
        },
        WrapOptions::new(),
    );

    let seen_by_tool = probe.call((), None).await.unwrap();

    assert_eq!(seen_by_tool, vec![EventType::Invocation]);
}

#[tokio::test]
async fn outcome_metadata_overrides_invocation_metadata() {
    let transport = RecordingTransport::accepting();
    let clock = TestClock::new();
    let search = tracker(&transport, &clock).wrap(
        "web_search",
        |query: String, _meta: Option<String>| async move {
            Ok::<_, ToolError>(vec![query.clone(), query])
        },
        WrapOptions::new()
            .get_metadata(|query: &String, meta: Option<&String>| {
                Ok(metadata(&[
                    ("query", json!(query)),
                    ("stage", json!("input")),
                    ("session", json!(meta)),
                ]))
            })
            .get_output_metadata(|results: &Vec<String>| {
                Ok(metadata(&[("stage", json!("output")), ("count", json!(results.len()))]))
            }),
    );

    search.call("rust".to_string(), Some("session-7".to_string())).await.unwrap();

    let payloads = transport.payloads().await;
    assert_eq!(
        payloads[0].metadata,
        Some(metadata(&[
            ("query", json!("rust")),
            ("stage", json!("input")),
            ("session", json!("session-7")),
        ]))
    );
    assert_eq!(
        payloads[1].metadata,
        Some(metadata(&[
            ("query", json!("rust")),
            ("stage", json!("output")),
            ("session", json!("session-7")),
            ("count", json!(2)),
        ]))
    );
}

#[tokio::test]
async fn error_metadata_is_merged_into_failure_event() {
    let transport = RecordingTransport::accepting();
    let clock = TestClock::new();
    let fetch = tracker(&transport, &clock).wrap(
        "fetch_page",
        |_url: String, _meta: Option<()>| async move {
            Err::<String, _>(ToolError("rate limited".to_string()))
        },
        WrapOptions::new()
            .get_metadata(|url: &String, _| Ok(metadata(&[("url", json!(url))])))
            .get_error_metadata(|error: &ToolError| {
                Ok(metadata(&[("error", json!(error.to_string()))]))
            }),
    );

    let _ = fetch.call("https://example.test".to_string(), None).await;

    assert_eq!(
        transport.payloads().await[1].metadata,
        Some(metadata(&[
            ("url", json!("https://example.test")),
            ("error", json!("tool failed: rate limited")),
        ]))
    );
}

#[tokio::test]
async fn failing_extractor_only_loses_its_metadata() {
    let transport = RecordingTransport::accepting();
    let clock = TestClock::new();
    let search = tracker(&transport, &clock).wrap(
        "web_search",
        |query: String, _meta: Option<()>| async move { Ok::<_, ToolError>(query) },
        WrapOptions::new()
            .get_metadata(|_: &String, _| Err("input extractor broke".into()))
            .get_output_metadata(|result: &String| Ok(metadata(&[("echo", json!(result))]))),
    );

    let result = search.call("rust".to_string(), None).await;

    assert_eq!(result, Ok("rust".to_string()));
    let payloads = transport.payloads().await;
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[0].metadata, None);
    assert_eq!(payloads[1].metadata, Some(metadata(&[("echo", json!("rust"))])));
}

#[tokio::test]
async fn panicking_extractor_does_not_reach_caller() {
    let transport = RecordingTransport::accepting();
    let clock = TestClock::new();
    let search = tracker(&transport, &clock).wrap(
        "web_search",
        |query: String, _meta: Option<()>| async move { Ok::<_, ToolError>(query.len()) },
        WrapOptions::new()
            .get_metadata(|query: &String, _| Ok(metadata(&[("query", json!(query))])))
            .get_output_metadata(|_: &usize| panic!("output extractor panicked")),
    );

    let result = search.call("rust".to_string(), None).await;

    assert_eq!(result, Ok(4));
    assert_eq!(
        transport.payloads().await[1].metadata,
        Some(metadata(&[("query", json!("rust"))]))
    );
}

#[tokio::test]
async fn failing_error_extractor_keeps_invocation_metadata() {
    let transport = RecordingTransport::accepting();
    let clock = TestClock::new();
    let fetch = tracker(&transport, &clock).wrap(
        "fetch_page",
        |_url: String, _meta: Option<()>| async move {
            Err::<String, _>(ToolError("boom".to_string()))
        },
        WrapOptions::new()
            .get_metadata(|_: &String, _| Ok(metadata(&[("a", json!(1))])))
            .get_error_metadata(|_: &ToolError| Err("error extractor broke".into())),
    );

    let result = fetch.call("https://example.test".to_string(), None).await;

    assert_eq!(result, Err(ToolError("boom".to_string())));
    assert_eq!(transport.event_types().await, vec![EventType::Invocation, EventType::Failure]);
    assert_eq!(transport.payloads().await[1].metadata, Some(metadata(&[("a", json!(1))])));
}

#[tokio::test]
async fn panicking_error_extractor_does_not_mask_tool_error() {
    let transport = RecordingTransport::accepting();
    let clock = TestClock::new();
    let fetch = tracker(&transport, &clock).wrap(
        "fetch_page",
        |_url: String, _meta: Option<()>| async move {
            Err::<String, _>(ToolError("boom".to_string()))
        },
        WrapOptions::new()
            .get_metadata(|url: &String, _| Ok(metadata(&[("url", json!(url))])))
            .get_error_metadata(|_: &ToolError| panic!("error extractor panicked")),
    );

    let result = fetch.call("https://example.test".to_string(), None).await;

    assert_eq!(result, Err(ToolError("boom".to_string())));
    assert_eq!(transport.event_types().await, vec![EventType::Invocation, EventType::Failure]);
    assert_eq!(
        transport.payloads().await[1].metadata,
        Some(metadata(&[("url", json!("https://example.test"))]))
    );
}

#[tokio::test]
async fn delivery_failures_never_change_tool_result() {
    let transport = RecordingTransport::failing(DeliveryError::server_error(503, "unavailable"));
    let clock = TestClock::new();
    let add = tracker(&transport, &clock).wrap(
        "add",
        |(a, b): (i64, i64), _meta: Option<()>| async move { Ok::<_, ToolError>(a + b) },
        WrapOptions::new(),
    );

    assert_eq!(add.call((40, 2), None).await, Ok(42));
    // Each event: 1 attempt + 3 retries.
    assert_eq!(transport.attempts().await, 8);
    assert_eq!(
        clock.sleeps(),
        [100, 200, 400, 100, 200, 400].map(Duration::from_millis).to_vec()
    );
}

#[tokio::test]
async fn wrapped_tool_is_reusable() {
    let transport = RecordingTransport::accepting();
    let clock = TestClock::new();
    let double = tracker(&transport, &clock).wrap(
        "double",
        |n: u32, _meta: Option<()>| async move { Ok::<_, ToolError>(n * 2) },
        WrapOptions::new(),
    );

    for n in 0..3 {
        assert_eq!(double.call(n, None).await, Ok(n * 2));
    }

    assert_eq!(double.tool_name(), "double");
    assert_eq!(transport.attempts().await, 6);
}
