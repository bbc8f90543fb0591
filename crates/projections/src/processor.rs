//! Projection processor for feeding events to projections.

use async_trait::async_trait;
use domain::{EventPublisher, PublishError};
use event_store::{EventEnvelope, EventStore};
use futures_util::StreamExt;

use crate::projection::Projection;
use crate::{ProjectionError, Result};

/// Delivers events to a set of projections.
///
/// The processor supports:
/// - Live delivery: registered as an [`EventPublisher`] on the command side,
///   it receives every committed event in commit order
/// - Rebuild: resets all projections and replays the whole log
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Box<dyn Projection>>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    /// Creates a new processor with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Delivers a single event to all registered projections.
    ///
    /// A failing projection does not stop delivery to the others; the first
    /// failure is returned once every projection has seen the event.
    #[tracing::instrument(
        skip(self, event),
        fields(event_type = %event.event_type, aggregate_id = %event.aggregate_id)
    )]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<()> {
        let mut first_failure = None;

        for projection in &self.projections {
            match projection.handle(event).await {
                Ok(()) => {
                    metrics::counter!("projections_events_processed").increment(1);
                }
                Err(err) => {
                    tracing::warn!(
                        projection = projection.name(),
                        error = %err,
                        "projection failed to handle event"
                    );
                    first_failure.get_or_insert(ProjectionError::Projection {
                        projection: projection.name(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Resets all projections and replays every event in the store.
    ///
    /// Meant for startup or maintenance; events committed while the rebuild
    /// runs may be delivered twice. Returns the number of events replayed.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<u64> {
        for projection in &self.projections {
            projection.reset().await?;
        }

        let mut stream = self.store.stream_all_events().await?;
        let mut replayed: u64 = 0;

        while let Some(result) = stream.next().await {
            let event = result?;
            self.process_event(&event).await?;
            replayed += 1;
        }

        tracing::info!(
            events_replayed = replayed,
            projections = self.projections.len(),
            "projections rebuilt"
        );

        Ok(replayed)
    }
}

#[async_trait]
impl<S: EventStore> EventPublisher for ProjectionProcessor<S> {
    fn name(&self) -> &str {
        "projections"
    }

    async fn publish(&self, event: &EventEnvelope) -> std::result::Result<(), PublishError> {
        self.process_event(event)
            .await
            .map_err(|err| PublishError {
                subscriber: EventPublisher::name(self).to_string(),
                event_type: event.event_type.clone(),
                reason: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionPosition;
    use common::AggregateId;
    use event_store::{AppendOptions, InMemoryEventStore, Version};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Counts events; fails on every event when `fail` is set.
    struct CountingProjection {
        count: Arc<RwLock<u64>>,
        position: Arc<RwLock<ProjectionPosition>>,
        fail: bool,
    }

    impl CountingProjection {
        fn new() -> Self {
            Self {
                count: Arc::new(RwLock::new(0)),
                position: Arc::new(RwLock::new(ProjectionPosition::zero())),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl Projection for CountingProjection {
        fn name(&self) -> &'static str {
            "CountingProjection"
        }

        async fn handle(&self, _event: &EventEnvelope) -> Result<()> {
            if self.fail {
                return Err(ProjectionError::Projection {
                    projection: "CountingProjection",
                    reason: "refused".to_string(),
                });
            }
            *self.count.write().await += 1;
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            Ok(())
        }

        async fn position(&self) -> ProjectionPosition {
            *self.position.read().await
        }

        async fn reset(&self) -> Result<()> {
            *self.count.write().await = 0;
            *self.position.write().await = ProjectionPosition::zero();
            Ok(())
        }
    }

    fn create_test_event(aggregate_id: &str, version: i64) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(AggregateId::from(aggregate_id))
            .aggregate_type("Game")
            .event_type("TestEvent")
            .version(Version::new(version))
            .payload_raw(serde_json::json!({"test": true}))
            .build()
    }

    async fn seeded_store(count: i64) -> InMemoryEventStore {
        let store = InMemoryEventStore::new();
        if count > 0 {
            let events = (1..=count).map(|v| create_test_event("game-1", v)).collect();
            store.append(events, AppendOptions::new()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn process_single_event() {
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);

        let mut processor = ProjectionProcessor::new(InMemoryEventStore::new());
        processor.register(Box::new(projection));

        processor
            .process_event(&create_test_event("game-1", 1))
            .await
            .unwrap();

        assert_eq!(*count_ref.read().await, 1);
    }

    #[tokio::test]
    async fn failing_projection_does_not_starve_others() {
        let healthy = CountingProjection::new();
        let count_ref = Arc::clone(&healthy.count);

        let mut processor = ProjectionProcessor::new(InMemoryEventStore::new());
        processor.register(Box::new(CountingProjection::failing()));
        processor.register(Box::new(healthy));

        let result = processor
            .process_event(&create_test_event("game-1", 1))
            .await;

        assert!(matches!(result, Err(ProjectionError::Projection { .. })));
        assert_eq!(*count_ref.read().await, 1);
    }

    #[tokio::test]
    async fn rebuild_resets_and_replays() {
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);
        let pos_ref = Arc::clone(&projection.position);

        let mut processor = ProjectionProcessor::new(seeded_store(3).await);
        processor.register(Box::new(projection));

        // Stale state from before the rebuild
        *count_ref.write().await = 99;

        let replayed = processor.rebuild_all().await.unwrap();

        assert_eq!(replayed, 3);
        assert_eq!(*count_ref.read().await, 3);
        assert_eq!(pos_ref.read().await.events_processed, 3);
    }

    #[tokio::test]
    async fn rebuild_of_empty_store() {
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);

        let mut processor = ProjectionProcessor::new(seeded_store(0).await);
        processor.register(Box::new(projection));

        assert_eq!(processor.rebuild_all().await.unwrap(), 0);
        assert_eq!(*count_ref.read().await, 0);
    }

    #[tokio::test]
    async fn multiple_projections_all_receive_events() {
        let proj1 = CountingProjection::new();
        let proj2 = CountingProjection::new();
        let count1 = Arc::clone(&proj1.count);
        let count2 = Arc::clone(&proj2.count);

        let mut processor = ProjectionProcessor::new(seeded_store(2).await);
        processor.register(Box::new(proj1));
        processor.register(Box::new(proj2));
        assert_eq!(processor.projection_count(), 2);

        processor.rebuild_all().await.unwrap();

        assert_eq!(*count1.read().await, 2);
        assert_eq!(*count2.read().await, 2);
    }

    #[tokio::test]
    async fn publisher_reports_projection_failure() {
        let mut processor = ProjectionProcessor::new(InMemoryEventStore::new());
        processor.register(Box::new(CountingProjection::failing()));

        let err = processor
            .publish(&create_test_event("game-1", 1))
            .await
            .unwrap_err();

        assert_eq!(err.subscriber, "projections");
        assert_eq!(err.event_type, "TestEvent");
    }
}
