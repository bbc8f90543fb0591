//! Command handling infrastructure.

use std::marker::PhantomData;
use std::sync::Arc;

use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;
use crate::locks::AggregateLocks;
use crate::publisher::EventPublisher;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The new version of the aggregate after the command.
    pub new_version: Version,
}

/// Trait for commands that can be executed against an aggregate.
///
/// Commands represent an intention to perform an action. They may be rejected
/// if the aggregate's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> &AggregateId;
}

/// Handler for executing commands against aggregates.
///
/// For each command the handler:
/// 1. Takes the aggregate's lock so commands on one id run one at a time
/// 2. Replays the aggregate from the event store
/// 3. Executes the command to produce events
/// 4. Appends the events with an optimistic version check, retrying the
///    whole attempt once on a conflict
/// 5. Publishes the committed events to every subscriber
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    locks: AggregateLocks,
    publishers: Vec<Arc<dyn EventPublisher>>,
    _phantom: PhantomData<fn() -> A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new command handler with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: AggregateLocks::default(),
            publishers: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Adds a subscriber that receives every committed event.
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an aggregate from the event store.
    ///
    /// If the aggregate doesn't exist, returns a default instance.
    pub async fn load(&self, aggregate_id: &AggregateId) -> Result<A, DomainError> {
        let events = self.store.get_events_for_aggregate(aggregate_id).await?;

        let mut aggregate = A::default();
        for envelope in events {
            let event: A::Event = serde_json::from_value(envelope.payload)?;
            aggregate
                .apply(event)
                .map_err(|e| DomainError::CorruptStream {
                    aggregate_id: aggregate_id.clone(),
                    reason: e.to_string(),
                })?;
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(
        &self,
        aggregate_id: &AggregateId,
    ) -> Result<Option<A>, DomainError> {
        let aggregate = self.load(aggregate_id).await?;
        if aggregate.id().is_some() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Executes `command` against the aggregate it targets.
    ///
    /// `decide` sees the replayed aggregate and the command; see
    /// [`execute`](Self::execute) for the retry and publish behaviour.
    pub async fn dispatch<C, F>(
        &self,
        command: &C,
        decide: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        C: Command<Aggregate = A>,
        F: Fn(&A, &C) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        self.execute(command.aggregate_id(), |aggregate| decide(aggregate, command))
            .await
    }

    /// Executes a command and persists the resulting events.
    ///
    /// The command function receives the current aggregate state and returns
    /// either a list of events to apply, or an error. It may run twice when
    /// the first append loses a version race.
    #[tracing::instrument(skip(self, command_fn), fields(aggregate_type = A::aggregate_type()))]
    pub async fn execute<F>(
        &self,
        aggregate_id: &AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: Fn(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let _guard = self.locks.acquire(aggregate_id).await;

        let result = match self.try_execute(aggregate_id, &command_fn).await {
            Err(err) if err.is_conflict() => {
                tracing::warn!(error = %err, "concurrency conflict, retrying command");
                metrics::counter!("command_conflict_retries_total").increment(1);
                self.try_execute(aggregate_id, &command_fn).await
            }
            result => result,
        };

        match &result {
            Ok(outcome) => {
                tracing::debug!(
                    events = outcome.events.len(),
                    version = %outcome.new_version,
                    "command executed"
                );
                metrics::counter!("commands_executed_total").increment(1);
            }
            Err(err) => {
                tracing::debug!(error = %err, "command rejected");
                metrics::counter!("commands_rejected_total").increment(1);
            }
        }

        result
    }

    async fn try_execute<F>(
        &self,
        aggregate_id: &AggregateId,
        command_fn: &F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: Fn(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let current_version = aggregate.version();

        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        let envelopes = self.build_envelopes(aggregate_id, current_version, &events)?;

        let new_version = self
            .store
            .append(
                envelopes.clone(),
                AppendOptions::expect_version(current_version),
            )
            .await?;

        aggregate
            .apply_events(events.iter().cloned())
            .map_err(|e| DomainError::CorruptStream {
                aggregate_id: aggregate_id.clone(),
                reason: e.to_string(),
            })?;
        aggregate.set_version(new_version);

        self.publish(&envelopes).await;

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Delivers committed events to every subscriber.
    ///
    /// Subscriber failures are logged and counted; the append already happened.
    async fn publish(&self, envelopes: &[EventEnvelope]) {
        for envelope in envelopes {
            for publisher in &self.publishers {
                if let Err(err) = publisher.publish(envelope).await {
                    tracing::error!(
                        subscriber = publisher.name(),
                        event_id = %envelope.event_id,
                        error = %err,
                        "failed to publish event"
                    );
                    metrics::counter!("projection_failures_total").increment(1);
                }
            }
        }
    }

    /// Builds event envelopes from domain events.
    fn build_envelopes(
        &self,
        aggregate_id: &AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate_id.clone())
                .aggregate_type(A::aggregate_type())
                .event_type(event.event_type())
                .version(version)
                .payload(event)?
                .build();
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}
