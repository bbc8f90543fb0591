//! Domain error types.

use common::AggregateId;
use event_store::EventStoreError;
use thiserror::Error;

use crate::game::GameError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// The game rejected the command.
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    /// Replaying the stored events failed. The log for this aggregate is
    /// inconsistent and no further commands can be processed against it.
    #[error("Corrupt event stream for {aggregate_id}: {reason}")]
    CorruptStream {
        aggregate_id: AggregateId,
        reason: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if the error is an optimistic concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::EventStore(err) if err.is_conflict())
    }
}
