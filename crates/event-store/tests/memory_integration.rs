//! In-memory event store integration tests.
//!
//! These exercise the store the way the command side uses it: many writers
//! racing on the same aggregate with optimistic version checks.

use std::sync::Arc;

use event_store::{
    AggregateId, AppendOptions, EventEnvelope, EventStore, EventStoreError, EventStoreExt,
    InMemoryEventStore, Version,
};
use futures_util::StreamExt;

fn create_event(aggregate_id: &AggregateId, version: Version, event_type: &str) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id.clone())
        .aggregate_type("Game")
        .event_type(event_type)
        .version(version)
        .payload_raw(serde_json::json!({ "type": event_type }))
        .build()
}

#[tokio::test]
async fn racing_writers_on_one_version_have_a_single_winner() {
    let store = InMemoryEventStore::new();
    let id = AggregateId::from("game-1");
    store
        .append(
            vec![create_event(&id, Version::first(), "GameStarted")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let mut handles = Vec::new();
    for n in 0..16 {
        let store = store.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            store
                .append(
                    vec![create_event(&id, Version::new(2), &format!("Writer{n}"))],
                    AppendOptions::expect_version(Version::first()),
                )
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(version) => {
                assert_eq!(version, Version::new(2));
                winners += 1;
            }
            Err(err) => assert!(err.is_conflict(), "unexpected error: {err}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(store.current_version(&id).await.unwrap(), Version::new(2));
    assert_eq!(store.get_events_for_aggregate(&id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn retrying_at_the_reported_version_succeeds() {
    let store = InMemoryEventStore::new();
    let id = AggregateId::from("game-1");
    store
        .append(
            vec![create_event(&id, Version::first(), "GameStarted")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let stale = store
        .append(
            vec![create_event(&id, Version::first(), "RoundStarted")],
            AppendOptions::expect_new(),
        )
        .await;

    let Err(EventStoreError::ConcurrencyConflict { actual, .. }) = stale else {
        panic!("expected a concurrency conflict, got {stale:?}");
    };

    let version = store
        .append(
            vec![create_event(&id, actual.next(), "RoundStarted")],
            AppendOptions::expect_version(actual),
        )
        .await
        .unwrap();
    assert_eq!(version, Version::new(2));
}

#[tokio::test]
async fn clones_share_one_log() {
    let store = InMemoryEventStore::new();
    let reader = store.clone();

    for n in 0..3 {
        let id = AggregateId::new(format!("game-{n}"));
        store
            .append(
                vec![create_event(&id, Version::first(), "GameStarted")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();
    }

    assert_eq!(reader.event_count().await, 3);

    let ids: Vec<String> = reader
        .stream_all_events()
        .await
        .unwrap()
        .map(|event| event.unwrap().aggregate_id.into_inner())
        .collect()
        .await;
    assert_eq!(ids, vec!["game-0", "game-1", "game-2"]);
}

#[tokio::test]
async fn concurrent_writers_on_distinct_aggregates_do_not_conflict() {
    let store = Arc::new(InMemoryEventStore::new());

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let store = store.clone();
            tokio::spawn(async move {
                let id = AggregateId::new(format!("game-{n}"));
                for v in 1..=5 {
                    store
                        .append(
                            vec![create_event(&id, Version::new(v), "MoveMade")],
                            AppendOptions::expect_version(Version::new(v - 1)),
                        )
                        .await
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.event_count().await, 40);
}
