//! Event delivery for toolsight.
//!
//! This crate moves one event from the SDK to the collector:
//!
//! 1. **Transport** - [`client::EventClient`] posts the payload, enforces the
//!    per-attempt timeout and classifies the outcome
//! 2. **Classification** - [`DeliveryError`] tags each failure as network,
//!    timeout, HTTP client, HTTP server or other
//! 3. **Retry** - [`retry::RetryExecutor`] re-runs retryable failures with
//!    capped exponential backoff
//!
//! Nothing here swallows errors; the tracker above is the only layer that
//! turns a failed delivery into data.
//!
//! # Example
//!
//! ```no_run
//! use toolsight_core::{EventPayload, EventType};
//! use toolsight_delivery::{
//!     client::{ClientConfig, EventClient, Transport},
//!     retry::{RetryExecutor, RetryPolicy},
//!     DeliveryError,
//! };
//!
//! # async fn example() -> Result<(), DeliveryError> {
//! let client = EventClient::new(ClientConfig::new("https://collector.test/v1/events", "tk"))?;
//! let executor = RetryExecutor::new(RetryPolicy::default());
//! let payload = EventPayload::new("search", EventType::Invocation, None, None);
//!
//! let ack = executor.execute(|| client.send(&payload)).await?;
//! assert!(ack.ok);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod retry;

pub use client::{ClientConfig, EventClient, Transport};
pub use error::{DeliveryError, ErrorKind, Result};
pub use retry::{RetryDecision, RetryExecutor, RetryPolicy};

/// Default per-attempt timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
