use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Result, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

#[derive(Default)]
struct Log {
    /// Every event in commit order.
    events: Vec<EventEnvelope>,
    /// Positions in `events` of each aggregate's stream, in version order.
    streams: HashMap<AggregateId, Vec<usize>>,
}

impl Log {
    fn stream(&self, aggregate_id: &AggregateId) -> impl Iterator<Item = &EventEnvelope> {
        self.streams
            .get(aggregate_id)
            .into_iter()
            .flatten()
            .map(|&position| &self.events[position])
    }

    fn version_of(&self, aggregate_id: &AggregateId) -> Option<Version> {
        self.stream(aggregate_id).last().map(|e| e.version)
    }
}

/// In-memory event store.
///
/// Holds the whole log behind a single lock so that an append (version check
/// plus insertion) is atomic. A per-aggregate index keeps loading one game
/// proportional to that game's history. Cloning the store shares the log.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    log: Arc<RwLock<Log>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.log.read().await.events.len()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let aggregate_id = events[0].aggregate_id.clone();
        let first_new_version = events[0].version;

        let mut log = self.log.write().await;

        let current_version = log
            .version_of(&aggregate_id)
            .unwrap_or_else(Version::initial);

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // Unique (aggregate, version) constraint
        if first_new_version != current_version.next() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let count = events.len();
        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(current_version);
        let start = log.events.len();
        log.events.extend(events);
        log.streams
            .entry(aggregate_id.clone())
            .or_default()
            .extend(start..start + count);

        tracing::trace!(%aggregate_id, %last_version, count, "events appended");
        metrics::counter!("events_appended_total").increment(count as u64);

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: &AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        Ok(self.log.read().await.stream(aggregate_id).cloned().collect())
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.log.read().await.events.clone();
        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn get_aggregate_version(&self, aggregate_id: &AggregateId) -> Result<Option<Version>> {
        Ok(self.log.read().await.version_of(aggregate_id))
    }
}
