//! Event tracking with fault isolation.
//!
//! [`Tracker::track`] is the boundary where delivery failures stop: it runs
//! the retry executor over the transport and converts whatever comes back
//! into a [`TrackingOutcome`]. No error escapes it.

use std::sync::Arc;

use toolsight_core::{Clock, DeliveryAck, EventPayload, EventType, Metadata, RealClock};
use toolsight_delivery::{DeliveryError, EventClient, RetryExecutor, Transport};

use crate::{
    config::Config,
    error::Result,
    wrap::{WrapOptions, WrappedTool},
};

/// Result of one tracking call.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingOutcome {
    /// The collector acknowledged the event.
    Delivered(DeliveryAck),
    /// Delivery failed after all permitted attempts.
    Failed(DeliveryError),
}

impl TrackingOutcome {
    /// Whether the event reached the collector.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }

    /// The final delivery error, if any.
    pub fn error(&self) -> Option<&DeliveryError> {
        match self {
            Self::Delivered(_) => None,
            Self::Failed(error) => Some(error),
        }
    }

    /// The collector's acknowledgement, if delivered.
    pub fn ack(&self) -> Option<&DeliveryAck> {
        match self {
            Self::Delivered(ack) => Some(ack),
            Self::Failed(_) => None,
        }
    }
}

/// Sends tool lifecycle events to the collector.
///
/// Cheap to clone and safe to share across tasks: clones share the
/// transport and read-only configuration, and every call owns its own
/// payload, timer and attempt counter.
#[derive(Debug, Clone)]
pub struct Tracker {
    transport: Arc<dyn Transport>,
    executor: RetryExecutor,
    clock: Arc<dyn Clock>,
    debug: bool,
}

impl Tracker {
    /// Creates a tracker that posts events over HTTP.
    ///
    /// # Errors
    ///
    /// Fails when the configuration does not validate or the HTTP client
    /// cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = EventClient::new(config.to_client_config())?;
        Ok(Self::with_transport(&config, Arc::new(client)))
    }

    /// Creates a tracker from [`Config::load`].
    ///
    /// # Errors
    ///
    /// Fails when configuration cannot be loaded or the tracker cannot be
    /// built from it.
    pub fn from_env() -> Result<Self> {
        Self::new(Config::load()?)
    }

    /// Creates a tracker that delivers through a caller-supplied transport.
    ///
    /// Retry budget and debug logging still come from `config`.
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(RealClock::new());
        Self {
            transport,
            executor: RetryExecutor::with_clock(config.to_retry_policy(), clock.clone())
                .with_debug(config.debug),
            clock,
            debug: config.debug,
        }
    }

    /// Replaces the clock used for durations and retry backoff.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.executor = RetryExecutor::with_clock(*self.executor.policy(), clock.clone())
            .with_debug(self.debug);
        self.clock = clock;
        self
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn debug(&self) -> bool {
        self.debug
    }

    /// Sends one event, retrying transient failures.
    ///
    /// Never fails: a delivery error after the last permitted attempt is
    /// returned as [`TrackingOutcome::Failed`]. `duration_ms` is dropped for
    /// invocation events.
    pub async fn track(
        &self,
        tool_name: &str,
        event_type: EventType,
        metadata: Option<Metadata>,
        duration_ms: Option<u64>,
    ) -> TrackingOutcome {
        let payload = EventPayload::new(tool_name, event_type, metadata, duration_ms);
        if self.debug {
            tracing::info!(
                tool_name,
                %event_type,
                duration_ms = payload.duration_ms,
                "Tracking event"
            );
        }

        let transport = &self.transport;
        match self.executor.execute(|| transport.send(&payload)).await {
            Ok(ack) => TrackingOutcome::Delivered(ack),
            Err(error) => {
                if self.debug {
                    tracing::warn!(
                        tool_name,
                        %event_type,
                        kind = %error.kind(),
                        status = error.status_code(),
                        error = %error,
                        "Event was not delivered"
                    );
                }
                TrackingOutcome::Failed(error)
            },
        }
    }

    /// Tracks that a tool is about to run.
    pub async fn track_invocation(
        &self,
        tool_name: &str,
        metadata: Option<Metadata>,
    ) -> TrackingOutcome {
        self.track(tool_name, EventType::Invocation, metadata, None).await
    }

    /// Tracks that a tool returned a value.
    pub async fn track_success(
        &self,
        tool_name: &str,
        metadata: Option<Metadata>,
        duration_ms: Option<u64>,
    ) -> TrackingOutcome {
        self.track(tool_name, EventType::Success, metadata, duration_ms).await
    }

    /// Tracks that a tool returned an error.
    pub async fn track_failure(
        &self,
        tool_name: &str,
        metadata: Option<Metadata>,
        duration_ms: Option<u64>,
    ) -> TrackingOutcome {
        self.track(tool_name, EventType::Failure, metadata, duration_ms).await
    }

    /// Instruments `tool` with invocation, success and failure tracking.
    ///
    /// See [`WrappedTool::call`] for the execution protocol.
    pub fn wrap<F, Fut, P, M, R, E>(
        &self,
        tool_name: impl Into<String>,
        tool: F,
        options: WrapOptions<P, M, R, E>,
    ) -> WrappedTool<F, P, M, R, E>
    where
        F: Fn(P, Option<M>) -> Fut,
        Fut: std::future::Future<Output = std::result::Result<R, E>>,
    {
        WrappedTool::new(self.clone(), tool_name.into(), tool, options)
    }
}
