//! Outbound port for committed events.

use async_trait::async_trait;
use event_store::EventEnvelope;
use thiserror::Error;

/// A subscriber failed to handle a published event.
#[derive(Debug, Error)]
#[error("{subscriber} failed to handle {event_type}: {reason}")]
pub struct PublishError {
    pub subscriber: String,
    pub event_type: String,
    pub reason: String,
}

/// Receives events after they have been durably appended.
///
/// The command handler publishes each committed event exactly once, in
/// version order, while it still holds the aggregate's lock. A failure here
/// never undoes the append.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Name used in logs when publishing fails.
    fn name(&self) -> &str;

    /// Handles a single committed event.
    async fn publish(&self, event: &EventEnvelope) -> Result<(), PublishError>;
}
