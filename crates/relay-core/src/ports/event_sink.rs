//! EventSink port - publish side of the bus binding.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Envelope;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    #[error("publish rejected: {0}")]
    Rejected(String),
}

/// Publishes envelopes to the bus.
///
/// Shared by every in-flight execution, so implementations must tolerate
/// concurrent calls.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, envelope: &Envelope) -> Result<(), SinkError>;
}
