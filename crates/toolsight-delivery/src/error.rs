//! Classified errors for event delivery.
//!
//! Every failure that reaches the retry executor is a [`DeliveryError`]
//! built at the transport boundary. Its kind and optional HTTP status are the
//! only inputs to the retry decision; nothing downstream inspects untyped
//! errors.

use std::fmt;

use thiserror::Error;

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Classified failure of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Connection-level failure: DNS, refused connection, reset stream.
    #[error("network error: {message}")]
    NetworkError {
        /// Error message describing the network failure
        message: String,
    },

    /// The collector did not respond within the configured timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// HTTP response indicated client error (4xx).
    #[error("HTTP {status_code}: {body}")]
    ClientError {
        /// HTTP status code (4xx)
        status_code: u16,
        /// Response body, or the status text when the body was empty
        body: String,
    },

    /// HTTP response indicated server error (5xx).
    #[error("HTTP {status_code}: {body}")]
    ServerError {
        /// HTTP status code (5xx)
        status_code: u16,
        /// Response body, or the status text when the body was empty
        body: String,
    },

    /// Anything the transport could not place in another category.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// HTTP status, when the failure came from a response
        status_code: Option<u16>,
    },
}

impl DeliveryError {
    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError { message: message.into() }
    }

    /// Creates a timeout error carrying the configured timeout.
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Creates a client error from an HTTP response.
    pub fn client_error(status_code: u16, body: impl Into<String>) -> Self {
        Self::ClientError { status_code, body: body.into() }
    }

    /// Creates a server error from an HTTP response.
    pub fn server_error(status_code: u16, body: impl Into<String>) -> Self {
        Self::ServerError { status_code, body: body.into() }
    }

    /// Creates an unclassified error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other { message: message.into(), status_code: None }
    }

    /// Classifies a non-2xx response by its status code.
    pub fn from_status(status_code: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status_code {
            400..=499 => Self::client_error(status_code, body),
            500..=599 => Self::server_error(status_code, body),
            _ => Self::Other {
                message: format!("HTTP {status_code}: {body}"),
                status_code: Some(status_code),
            },
        }
    }

    /// Kind discriminator of this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::from(self)
    }

    /// HTTP status, when the error originated from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ClientError { status_code, .. } | Self::ServerError { status_code, .. } => {
                Some(*status_code)
            },
            Self::Other { status_code, .. } => *status_code,
            Self::NetworkError { .. } | Self::Timeout { .. } => None,
        }
    }

    /// Determines if this error represents a temporary failure that should be
    /// retried.
    ///
    /// Network failures, timeouts and 5xx responses are retried. Any status
    /// in the 4xx range is final. Everything else is retried.
    pub fn is_retryable(&self) -> bool {
        if matches!(self, Self::NetworkError { .. } | Self::Timeout { .. }) {
            return true;
        }

        match self.status_code() {
            Some(status) if (400..500).contains(&status) => false,
            Some(_) | None => true,
        }
    }
}

/// Kind of delivery error, used for logging and the retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection-level failure.
    Network,
    /// HTTP 4xx response.
    HttpClient,
    /// HTTP 5xx response.
    HttpServer,
    /// Deadline exceeded.
    Timeout,
    /// Unclassified.
    Other,
}

impl From<&DeliveryError> for ErrorKind {
    fn from(error: &DeliveryError) -> Self {
        match error {
            DeliveryError::NetworkError { .. } => Self::Network,
            DeliveryError::Timeout { .. } => Self::Timeout,
            DeliveryError::ClientError { .. } => Self::HttpClient,
            DeliveryError::ServerError { .. } => Self::HttpServer,
            DeliveryError::Other { .. } => Self::Other,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::HttpClient => write!(f, "http-client"),
            Self::HttpServer => write!(f, "http-server"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other => write!(f, "other"),
        }
    }
}
