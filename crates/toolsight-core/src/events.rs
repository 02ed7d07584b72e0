//! Event wire model.
//!
//! An [`EventPayload`] is built fresh for every tracking call and serialized
//! as the request body. Optional fields are omitted from the JSON entirely
//! when absent rather than sent as `null`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;

/// Lifecycle point of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The tool is about to run.
    Invocation,

    /// The tool returned a value.
    Success,

    /// The tool returned an error.
    Failure,
}

impl EventType {
    /// Whether events of this type carry an elapsed duration.
    ///
    /// Only outcome events do; an invocation happens before anything has
    /// elapsed.
    pub fn carries_duration(self) -> bool {
        !matches!(self, Self::Invocation)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invocation => write!(f, "invocation"),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Body of one event delivery request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Name of the instrumented tool.
    pub tool_name: String,
    /// Lifecycle point this event describes.
    pub event_type: EventType,
    /// Elapsed milliseconds since the tool call started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Caller-supplied annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl EventPayload {
    /// Builds a payload, dropping `duration_ms` for invocation events.
    pub fn new(
        tool_name: impl Into<String>,
        event_type: EventType,
        metadata: Option<Metadata>,
        duration_ms: Option<u64>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            event_type,
            duration_ms: duration_ms.filter(|_| event_type.carries_duration()),
            metadata,
        }
    }
}

/// Acknowledgement returned by the collector for a 2xx delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAck {
    /// Whether the collector accepted the event.
    pub ok: bool,
    /// Any further fields the collector returned.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DeliveryAck {
    /// Plain `{ "ok": true }` acknowledgement.
    pub fn accepted() -> Self {
        Self { ok: true, extra: serde_json::Map::new() }
    }
}
