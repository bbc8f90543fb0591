//! Integration tests for the Game aggregate.
//!
//! These tests drive games through the service against the in-memory store
//! and check what ends up in the log.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::AggregateId;
use domain::{
    Aggregate, DomainError, EventPublisher, Game, GameError, GameEvent, GameService, GameState,
    MakeMove, Move, PlayerId, PlayerSlot, PublishError, StartGame, TerminationPolicy,
};
use event_store::{
    AppendOptions, EventEnvelope, EventStore, EventStoreExt, InMemoryEventStore, Version,
};

fn create_service() -> GameService<InMemoryEventStore> {
    GameService::new(InMemoryEventStore::new())
}

fn event_types(envelopes: &[EventEnvelope]) -> Vec<&str> {
    envelopes.iter().map(|e| e.event_type.as_str()).collect()
}

mod game_lifecycle {
    use super::*;

    #[tokio::test]
    async fn best_of_three_played_to_completion() {
        let service = create_service();
        let id = AggregateId::from("lifecycle");

        let result = service
            .start_game(StartGame::new(id.clone(), "alice", 3))
            .await
            .unwrap();
        assert_eq!(result.aggregate.state(), GameState::Ongoing);
        assert_eq!(result.new_version, Version::first());

        for (player, r#move) in [
            ("alice", Move::Rock),
            ("bob", Move::Scissors),
            ("bob", Move::Rock),
            ("alice", Move::Paper),
        ] {
            service
                .make_move(MakeMove::new(id.clone(), player, r#move))
                .await
                .unwrap();
        }

        let game = service.get_game(&id).await.unwrap().unwrap();
        assert_eq!(game.state(), GameState::Won);
        assert_eq!(game.winner(), Some(&PlayerId::from("alice")));
        assert_eq!(game.rounds().len(), 2);

        let events = service.events(&id).await.unwrap();
        assert_eq!(
            event_types(&events),
            vec![
                "GameStarted",
                "RoundStarted",
                "FirstPlayerJoined",
                "MoveMade",
                "SecondPlayerJoined",
                "MoveMade",
                "RoundWon",
                "RoundEnded",
                "RoundStarted",
                "MoveMade",
                "MoveMade",
                "RoundWon",
                "RoundEnded",
                "GameWon",
                "GameEnded",
            ]
        );
    }

    #[tokio::test]
    async fn versions_are_contiguous_from_one() {
        let service = create_service();
        let id = AggregateId::from("versions");

        service
            .start_game(StartGame::new(id.clone(), "alice", 3))
            .await
            .unwrap();
        service
            .make_move(MakeMove::new(id.clone(), "alice", Move::Rock))
            .await
            .unwrap();
        service
            .make_move(MakeMove::new(id.clone(), "bob", Move::Rock))
            .await
            .unwrap();

        let events = service.events(&id).await.unwrap();
        let versions: Vec<i64> = events.iter().map(|e| e.version.as_i64()).collect();
        assert_eq!(versions, (1..=events.len() as i64).collect::<Vec<_>>());
        assert!(events.iter().all(|e| e.aggregate_type == "Game"));
    }

    #[tokio::test]
    async fn all_rounds_policy_ignores_early_majority() {
        let service = create_service();
        let id = AggregateId::from("all-rounds");

        service
            .start_game(
                StartGame::new(id.clone(), "alice", 3).with_policy(TerminationPolicy::AllRounds),
            )
            .await
            .unwrap();

        for _ in 0..2 {
            service
                .make_move(MakeMove::new(id.clone(), "alice", Move::Paper))
                .await
                .unwrap();
            service
                .make_move(MakeMove::new(id.clone(), "bob", Move::Rock))
                .await
                .unwrap();
        }

        let game = service.get_game(&id).await.unwrap().unwrap();
        assert_eq!(game.state(), GameState::Ongoing);
        assert_eq!(game.round_wins(PlayerSlot::First), 2);
    }

    #[tokio::test]
    async fn stored_events_replay_to_the_same_game() {
        let service = create_service();
        let id = AggregateId::from("replay");

        service
            .start_game(StartGame::new(id.clone(), "alice", 1))
            .await
            .unwrap();
        service
            .make_move(MakeMove::new(id.clone(), "alice", Move::Rock))
            .await
            .unwrap();
        let result = service
            .make_move(MakeMove::new(id.clone(), "bob", Move::Rock))
            .await
            .unwrap();

        let events: Vec<GameEvent> = service
            .events(&id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| serde_json::from_value(e.payload).unwrap())
            .collect();
        let mut replayed = Game::replay(events).unwrap();
        replayed.set_version(result.new_version);

        assert_eq!(replayed, result.aggregate);
        assert_eq!(replayed.state(), GameState::Tied);
    }
}

mod rejections {
    use super::*;

    #[tokio::test]
    async fn rejected_commands_leave_the_log_untouched() {
        let store = InMemoryEventStore::new();
        let service = GameService::new(store.clone());
        let id = AggregateId::from("rejections");

        service
            .start_game(StartGame::new(id.clone(), "alice", 1))
            .await
            .unwrap();
        service
            .make_move(MakeMove::new(id.clone(), "alice", Move::Rock))
            .await
            .unwrap();
        service
            .make_move(MakeMove::new(id.clone(), "bob", Move::Paper))
            .await
            .unwrap();
        let before = store.event_count().await;

        let restart = service
            .start_game(StartGame::new(id.clone(), "carol", 3))
            .await;
        let late_move = service
            .make_move(MakeMove::new(id.clone(), "alice", Move::Rock))
            .await;

        assert!(matches!(
            restart,
            Err(DomainError::Game(GameError::InvalidState { .. }))
        ));
        assert!(matches!(
            late_move,
            Err(DomainError::Game(GameError::InvalidState {
                current_state: GameState::Won,
                ..
            }))
        ));
        assert_eq!(store.event_count().await, before);
    }

    #[tokio::test]
    async fn third_player_hits_capacity() {
        let service = create_service();
        let id = AggregateId::from("capacity");

        service
            .start_game(StartGame::new(id.clone(), "alice", 3))
            .await
            .unwrap();
        service
            .make_move(MakeMove::new(id.clone(), "alice", Move::Rock))
            .await
            .unwrap();
        service
            .make_move(MakeMove::new(id.clone(), "bob", Move::Rock))
            .await
            .unwrap();

        let result = service
            .make_move(MakeMove::new(id.clone(), "carol", Move::Rock))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Game(GameError::Capacity { .. }))
        ));
    }

    #[tokio::test]
    async fn repeated_move_appends_nothing() {
        let store = InMemoryEventStore::new();
        let service = GameService::new(store.clone());
        let id = AggregateId::from("repeat");

        service
            .start_game(StartGame::new(id.clone(), "alice", 3))
            .await
            .unwrap();
        service
            .make_move(MakeMove::new(id.clone(), "alice", Move::Rock))
            .await
            .unwrap();

        let result = service
            .make_move(MakeMove::new(id.clone(), "alice", Move::Scissors))
            .await
            .unwrap();

        assert!(result.events.is_empty());
        assert_eq!(result.new_version, Version::new(4));
        assert_eq!(store.current_version(&id).await.unwrap(), Version::new(4));
    }

    #[tokio::test]
    async fn corrupt_log_blocks_further_commands() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::from("corrupt");
        let history = [
            GameEvent::game_started(
                id.clone(),
                PlayerId::from("alice"),
                3,
                TerminationPolicy::BestOf,
            ),
            GameEvent::round_started(1),
            GameEvent::move_made(PlayerId::from("ghost"), 1, Move::Rock),
        ];
        let envelopes = history
            .iter()
            .enumerate()
            .map(|(n, event)| {
                EventEnvelope::builder()
                    .aggregate_id(id.clone())
                    .aggregate_type("Game")
                    .event_type(domain::DomainEvent::event_type(event))
                    .version(Version::new(n as i64 + 1))
                    .payload(event)
                    .unwrap()
                    .build()
            })
            .collect();
        store
            .append(envelopes, AppendOptions::expect_new())
            .await
            .unwrap();

        let service = GameService::new(store);
        let result = service
            .make_move(MakeMove::new(id.clone(), "alice", Move::Rock))
            .await;

        assert!(matches!(result, Err(DomainError::CorruptStream { .. })));
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn simultaneous_first_moves_seat_both_players() {
        let service = Arc::new(create_service());
        let id = AggregateId::from("race");
        service
            .start_game(StartGame::new(id.clone(), "alice", 3))
            .await
            .unwrap();

        let tasks: Vec<_> = [("alice", Move::Rock), ("bob", Move::Paper)]
            .into_iter()
            .map(|(player, r#move)| {
                let service = Arc::clone(&service);
                let id = id.clone();
                tokio::spawn(async move {
                    service
                        .make_move(MakeMove::new(id, player, r#move))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let game = service.get_game(&id).await.unwrap().unwrap();
        assert!(game.first_player().is_some());
        assert!(game.second_player().is_some());
        assert_ne!(game.first_player(), game.second_player());
        let decided = game.round_wins(PlayerSlot::First) + game.round_wins(PlayerSlot::Second);
        assert_eq!(decided, 1);

        let types = event_types(&service.events(&id).await.unwrap()).join(",");
        assert_eq!(types.matches("RoundStarted").count(), 1);
        assert_eq!(types.matches("PlayerJoined").count(), 2);
    }

    #[tokio::test]
    async fn independent_games_progress_in_parallel() {
        let service = Arc::new(create_service());

        let tasks: Vec<_> = (0..10)
            .map(|n| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let id = AggregateId::new(format!("game-{n}"));
                    service
                        .start_game(StartGame::new(id.clone(), "alice", 1))
                        .await?;
                    service
                        .make_move(MakeMove::new(id.clone(), "alice", Move::Rock))
                        .await?;
                    service
                        .make_move(MakeMove::new(id, "bob", Move::Scissors))
                        .await
                })
            })
            .collect();

        for task in tasks {
            let result = task.await.unwrap().unwrap();
            assert_eq!(result.aggregate.state(), GameState::Won);
        }
    }
}

mod publishing {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, i64)>>,
    }

    #[async_trait]
    impl EventPublisher for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn publish(&self, event: &EventEnvelope) -> Result<(), PublishError> {
            self.seen
                .lock()
                .unwrap()
                .push((event.event_type.clone(), event.version.as_i64()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn subscribers_see_every_committed_event_once_in_order() {
        let recorder = Arc::new(Recorder::default());
        let service = create_service().with_publisher(recorder.clone());
        let id = AggregateId::from("published");

        service
            .start_game(StartGame::new(id.clone(), "alice", 3))
            .await
            .unwrap();
        service
            .make_move(MakeMove::new(id.clone(), "alice", Move::Rock))
            .await
            .unwrap();
        // No-op and rejected commands publish nothing
        service
            .make_move(MakeMove::new(id.clone(), "alice", Move::Paper))
            .await
            .unwrap();
        let _ = service
            .start_game(StartGame::new(id.clone(), "alice", 3))
            .await;

        let seen = recorder.seen.lock().unwrap().clone();
        let stored = service.events(&id).await.unwrap();
        assert_eq!(seen.len(), stored.len());
        for ((event_type, version), envelope) in seen.iter().zip(&stored) {
            assert_eq!(event_type, &envelope.event_type);
            assert_eq!(*version, envelope.version.as_i64());
        }
    }
}
