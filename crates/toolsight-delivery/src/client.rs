//! HTTP transport for event delivery.
//!
//! Handles request construction, the per-attempt timeout, response
//! processing, and classification of every failure into a
//! [`DeliveryError`] the retry executor can reason about.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{
    header::{CONTENT_TYPE, USER_AGENT},
    Response, StatusCode,
};
use toolsight_core::{DeliveryAck, EventPayload};
use tracing::{info_span, Instrument};

use crate::error::{DeliveryError, Result};

/// Header carrying the project api key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Error bodies longer than this are truncated before they are embedded in
/// an error message.
const MAX_ERROR_BODY_SIZE: usize = 1024;

/// One delivery attempt for one event.
///
/// Implementations must classify every failure; a call either returns the
/// collector's acknowledgement or a [`DeliveryError`], never both.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends a single event.
    async fn send(&self, payload: &EventPayload) -> Result<DeliveryAck>;
}

/// Configuration for the event delivery client.
#[derive(Clone)]
pub struct ClientConfig {
    /// Collector URL events are posted to.
    pub endpoint: String,
    /// Project api key sent with every request.
    pub api_key: String,
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Emit diagnostic log lines for each attempt.
    pub debug: bool,
}

impl ClientConfig {
    /// Creates a configuration with the default timeout and user agent.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: Duration::from_millis(crate::DEFAULT_TIMEOUT_MS),
            user_agent: concat!("toolsight-rust/", env!("CARGO_PKG_VERSION")).to_string(),
            debug: false,
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"***")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("debug", &self.debug)
            .finish()
    }
}

/// HTTP client that posts events to the collector.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct EventClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl EventClient {
    /// Creates a new event client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Other` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeliveryError::other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn deliver(&self, payload: &EventPayload) -> Result<DeliveryAck> {
        let debug = self.config.debug;
        if debug {
            tracing::info!(endpoint = %self.config.endpoint, "Sending event");
        }

        let body = serde_json::to_vec(payload)
            .map_err(|e| DeliveryError::other(format!("failed to serialize event: {e}")))?;

        let request = self
            .client
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(USER_AGENT, &self.config.user_agent)
            .body(body);

        // Dropping the send future on expiry cancels the in-flight request.
        let response = match tokio::time::timeout(self.config.timeout, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(self.classify_request_error(&e)),
            Err(_) => return Err(self.timed_out()),
        };

        let status = response.status();
        if status.is_success() {
            let ack = self.parse_ack(response).await?;
            if debug {
                tracing::info!(status = status.as_u16(), ok = ack.ok, "Event delivered");
            }
            return Ok(ack);
        }

        let body = read_error_body(response).await;
        if debug {
            log_rejection(status, &body);
        }

        let text = if body.is_empty() {
            status.canonical_reason().unwrap_or_default().to_string()
        } else {
            body
        };
        Err(DeliveryError::from_status(status.as_u16(), text))
    }

    /// Parses a 2xx body as the collector acknowledgement.
    async fn parse_ack(&self, response: Response) -> Result<DeliveryAck> {
        let bytes = response.bytes().await.map_err(|e| self.classify_request_error(&e))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| DeliveryError::other(format!("invalid delivery acknowledgement: {e}")))
    }

    fn timed_out(&self) -> DeliveryError {
        let timeout_ms = self.config.timeout_ms();
        if self.config.debug {
            tracing::warn!(timeout_ms, "Event delivery timed out");
        }
        DeliveryError::timeout(timeout_ms)
    }

    fn classify_request_error(&self, e: &reqwest::Error) -> DeliveryError {
        if e.is_timeout() {
            return self.timed_out();
        }
        if self.config.debug {
            tracing::warn!(error = %e, "Event request failed");
        }
        if e.is_builder() {
            return DeliveryError::other(format!("invalid request: {e}"));
        }
        if e.is_connect() {
            return DeliveryError::network(format!("connection failed: {e}"));
        }
        DeliveryError::network(e.to_string())
    }
}

#[async_trait]
impl Transport for EventClient {
    async fn send(&self, payload: &EventPayload) -> Result<DeliveryAck> {
        let span = info_span!(
            "event_delivery",
            tool_name = %payload.tool_name,
            event_type = %payload.event_type,
        );

        self.deliver(payload).instrument(span).await
    }
}

/// Reads a non-2xx body as text. A failed read yields an empty string.
async fn read_error_body(response: Response) -> String {
    match response.bytes().await {
        Ok(bytes) if bytes.len() > MAX_ERROR_BODY_SIZE => {
            let suffix = "... (truncated)";
            let truncated = String::from_utf8_lossy(&bytes[..MAX_ERROR_BODY_SIZE - suffix.len()]);
            format!("{truncated}{suffix}")
        },
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    }
}

fn log_rejection(status: StatusCode, body: &str) {
    let status_code = status.as_u16();
    match status {
        StatusCode::UNAUTHORIZED => {
            tracing::warn!(status = status_code, body, "Collector rejected the api key");
        },
        StatusCode::BAD_REQUEST => {
            tracing::warn!(status = status_code, body, "Collector rejected the event payload");
        },
        StatusCode::TOO_MANY_REQUESTS => {
            tracing::warn!(status = status_code, body, "Collector rate limit exceeded");
        },
        _ => {
            tracing::warn!(status = status_code, body, "Event delivery failed");
        },
    }
}
