//! Core projection trait and position tracking.

use async_trait::async_trait;
use domain::{Aggregate, Game, GameEvent};
use event_store::EventEnvelope;

use crate::Result;

/// Tracks how far a projection has read into the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of events handled since the last reset.
    pub events_processed: u64,
}

impl ProjectionPosition {
    /// Creates a new position at zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Advances the position by one event.
    pub fn advance(&self) -> Self {
        Self {
            events_processed: self.events_processed + 1,
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.events_processed)
    }
}

/// A projection that processes events and updates a read model.
///
/// Events arrive in commit order. A projection must tolerate events it does
/// not care about, including events for other aggregate types.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Handles a single event, updating the projection's read model.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}

/// Decodes the game event carried by an envelope.
///
/// Returns None for envelopes of other aggregate types.
pub(crate) fn decode_game_event(event: &EventEnvelope) -> Result<Option<GameEvent>> {
    if event.aggregate_type != Game::aggregate_type() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(event.payload.clone())?))
}
