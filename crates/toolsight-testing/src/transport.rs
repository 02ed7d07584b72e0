//! In-memory transport that records every attempt.

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use toolsight_core::{DeliveryAck, EventPayload, EventType};
use toolsight_delivery::{DeliveryError, Transport};

type Outcome = Result<DeliveryAck, DeliveryError>;

/// Scripted [`Transport`] that records the payload of each attempt.
///
/// Scripted outcomes are consumed first; once exhausted, every further
/// attempt gets the fallback outcome. Clones share the same log.
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    sent: Arc<RwLock<Vec<EventPayload>>>,
    script: Arc<RwLock<VecDeque<Outcome>>>,
    fallback: Outcome,
}

impl RecordingTransport {
    /// Transport that acknowledges every attempt.
    pub fn accepting() -> Self {
        Self::with_fallback(Ok(DeliveryAck::accepted()))
    }

    /// Transport that fails every attempt with `error`.
    pub fn failing(error: DeliveryError) -> Self {
        Self::with_fallback(Err(error))
    }

    fn with_fallback(fallback: Outcome) -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
            script: Arc::new(RwLock::new(VecDeque::new())),
            fallback,
        }
    }

    /// Queues outcomes for the next attempts, ahead of the fallback.
    pub fn with_script(self, outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        if let Ok(mut script) = self.script.try_write() {
            script.extend(outcomes);
        }
        self
    }

    /// Payloads of every attempt, oldest first.
    pub async fn payloads(&self) -> Vec<EventPayload> {
        self.sent.read().await.clone()
    }

    /// Event types of every attempt, oldest first.
    pub async fn event_types(&self) -> Vec<EventType> {
        self.sent.read().await.iter().map(|payload| payload.event_type).collect()
    }

    /// Number of attempts made.
    pub async fn attempts(&self) -> usize {
        self.sent.read().await.len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, payload: &EventPayload) -> Result<DeliveryAck, DeliveryError> {
        self.sent.write().await.push(payload.clone());
        let scripted = self.script.write().await.pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}
