//! HTTP collector mocking for delivery tests.

use std::time::Duration;

use http::StatusCode;
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Path the mock collector accepts events on.
pub const EVENTS_PATH: &str = "/v1/events";

/// Types of mock responses.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// `200 {"ok": true}`.
    Ack,
    /// Arbitrary status with a text body.
    Status {
        /// Response status
        status: StatusCode,
        /// Response body
        body: String,
    },
    /// Acknowledgement sent only after `delay`.
    Slow {
        /// Delay before the response is sent
        delay: Duration,
    },
}

impl MockResponse {
    /// Status response with an empty body.
    pub fn status(status: StatusCode) -> Self {
        Self::Status { status, body: String::new() }
    }

    fn template(&self) -> ResponseTemplate {
        match self {
            Self::Ack => ResponseTemplate::new(200).set_body_json(json!({"ok": true})),
            Self::Status { status, body } => {
                ResponseTemplate::new(status.as_u16()).set_body_string(body.clone())
            },
            Self::Slow { delay } => ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(*delay),
        }
    }
}

/// Mock analytics collector backed by wiremock.
pub struct MockCollector {
    server: MockServer,
}

impl MockCollector {
    /// Starts a collector on a random port.
    pub async fn start() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Full URL of the events endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{EVENTS_PATH}", self.server.uri())
    }

    /// Answers every event with `response`.
    pub async fn respond_always(&self, response: MockResponse) {
        Mock::given(method("POST"))
            .and(path(EVENTS_PATH))
            .respond_with(response.template())
            .mount(&self.server)
            .await;
    }

    /// Answers successive events with `responses`, in order. Requests beyond
    /// the sequence are acknowledged.
    pub async fn respond_sequence(&self, responses: impl IntoIterator<Item = MockResponse>) {
        for (priority, response) in (1_u8..).zip(responses) {
            Mock::given(method("POST"))
                .and(path(EVENTS_PATH))
                .respond_with(response.template())
                .up_to_n_times(1)
                .with_priority(priority)
                .mount(&self.server)
                .await;
        }
        Mock::given(method("POST"))
            .and(path(EVENTS_PATH))
            .respond_with(MockResponse::Ack.template())
            .with_priority(u8::MAX)
            .mount(&self.server)
            .await;
    }

    /// JSON bodies of every request received, oldest first.
    pub async fn received_events(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }

    /// `x-api-key` header of every request received, oldest first.
    pub async fn received_api_keys(&self) -> Vec<Option<String>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| {
                request
                    .headers
                    .get("x-api-key")
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
            })
            .collect()
    }

    /// Number of requests received.
    pub async fn request_count(&self) -> usize {
        self.server.received_requests().await.map(|requests| requests.len()).unwrap_or(0)
    }

    /// Asserts that exactly `expected` requests were received.
    pub async fn assert_request_count(&self, expected: usize) {
        let received = self.request_count().await;
        assert_eq!(received, expected, "Expected {expected} requests, received {received}");
    }
}
