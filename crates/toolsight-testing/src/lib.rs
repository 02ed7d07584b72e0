//! Test infrastructure for toolsight.
//!
//! Provides a wiremock-backed collector, a scripted in-memory transport and
//! the virtual clock, so delivery, retry and wrapping behavior can be tested
//! without real network calls or real sleeps.

pub mod http;
pub mod transport;

pub use http::{MockCollector, MockResponse, EVENTS_PATH};
pub use toolsight_core::{Clock, TestClock};
pub use transport::RecordingTransport;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once per process.
///
/// Later calls are no-ops, so every test may call this.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,toolsight=debug")),
        )
        .with_test_writer()
        .try_init();
}
