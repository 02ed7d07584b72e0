//! Tool-call analytics for async Rust.
//!
//! Wrap a tool function with [`Tracker::wrap`] and every call reports an
//! `invocation` event before the tool runs, then a `success` or `failure`
//! event with the elapsed time. Delivery retries transient failures with
//! exponential backoff and never changes what the tool returns.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use toolsight::{Config, Tracker, WrapOptions};
//!
//! # async fn example() -> toolsight::Result<()> {
//! let tracker = Tracker::new(Config::new("tk_live_123"))?;
//!
//! let search = tracker.wrap(
//!     "web_search",
//!     |query: String, _meta: Option<()>| async move {
//!         Ok::<_, std::io::Error>(vec![format!("result for {query}")])
//!     },
//!     WrapOptions::new().get_metadata(|query: &String, _| {
//!         let mut metadata = toolsight::Metadata::new();
//!         metadata.insert("query".to_string(), json!(query));
//!         Ok(metadata)
//!     }),
//! );
//!
//! let results = search.call("rust".to_string(), None).await;
//! # let _ = results;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod tracker;
pub mod wrap;

pub use config::{Config, DEFAULT_ENDPOINT};
pub use error::{Result, TrackerError};
pub use logging::init_tracing;
pub use toolsight_core::{merge, DeliveryAck, EventPayload, EventType, Metadata};
pub use toolsight_delivery::{DeliveryError, ErrorKind, Transport};
pub use tracker::{Tracker, TrackingOutcome};
pub use wrap::{ExtractorError, ExtractorResult, WrapOptions, WrappedTool};
