//! Errors surfaced while constructing a tracker.
//!
//! Tracking itself never fails: delivery errors end up inside
//! [`TrackingOutcome`](crate::TrackingOutcome). These variants cover the only
//! fallible steps, loading configuration and building the transport.

use thiserror::Error;
use toolsight_delivery::DeliveryError;

/// Result type alias for tracker construction.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Failure to build a [`Tracker`](crate::Tracker).
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A configuration value is missing or out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration
        message: String,
    },

    /// Configuration sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// The HTTP transport could not be initialized.
    #[error("failed to initialize transport: {0}")]
    Transport(#[from] DeliveryError),
}

impl TrackerError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }
}

impl From<figment::Error> for TrackerError {
    fn from(error: figment::Error) -> Self {
        Self::Load(Box::new(error))
    }
}
