//! Core aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// Stored alongside the payload so readers can route without decoding it.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates in an event-sourced system.
///
/// In event sourcing, aggregates:
/// - Are rebuilt by replaying events
/// - Generate events from commands
/// - Apply events to update state (pure, deterministic)
pub trait Aggregate: Default + Clone + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    ///
    /// Returns None for a new, uninitialized aggregate.
    fn id(&self) -> Option<&AggregateId>;

    /// Returns the current version of the aggregate.
    ///
    /// Version starts at 0 for a new aggregate and increments with each event.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by the command handler after loading events.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the aggregate, updating its state.
    ///
    /// Must be pure and deterministic. Events are facts, so the only failure
    /// allowed is an event that contradicts the state it is applied to, which
    /// means the stream itself is inconsistent.
    fn apply(&mut self, event: Self::Event) -> Result<(), Self::Error>;

    /// Applies multiple events in sequence, stopping at the first failure.
    fn apply_events(
        &mut self,
        events: impl IntoIterator<Item = Self::Event>,
    ) -> Result<(), Self::Error> {
        for event in events {
            self.apply(event)?;
        }
        Ok(())
    }

    /// Rebuilds an aggregate from the empty state.
    fn replay(events: impl IntoIterator<Item = Self::Event>) -> Result<Self, Self::Error> {
        let mut aggregate = Self::default();
        aggregate.apply_events(events)?;
        Ok(aggregate)
    }
}
