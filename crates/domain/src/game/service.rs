//! Game service providing a simplified API for game operations.

use std::sync::Arc;

use common::AggregateId;
use event_store::{EventEnvelope, EventStore};

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::publisher::EventPublisher;

use super::{Game, GameCommand, MakeMove, StartGame};

/// Service for managing games.
///
/// Wraps the command handler so callers deal in game commands rather than
/// closures over the aggregate.
pub struct GameService<S: EventStore> {
    handler: CommandHandler<S, Game>,
}

impl<S: EventStore> GameService<S> {
    /// Creates a new game service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Adds a subscriber for committed game events.
    pub fn with_publisher(self, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            handler: self.handler.with_publisher(publisher),
        }
    }

    /// Starts a new game.
    #[tracing::instrument(skip(self))]
    pub async fn start_game(&self, cmd: StartGame) -> Result<CommandResult<Game>, DomainError> {
        self.handler
            .dispatch(&cmd, |game, cmd| game.start(cmd))
            .await
    }

    /// Makes a move, joining the game if the player is new.
    #[tracing::instrument(skip(self))]
    pub async fn make_move(&self, cmd: MakeMove) -> Result<CommandResult<Game>, DomainError> {
        self.handler
            .dispatch(&cmd, |game, cmd| game.make_move(&cmd.player, cmd.r#move))
            .await
    }

    /// Executes any game command.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, cmd: GameCommand) -> Result<CommandResult<Game>, DomainError> {
        self.handler.dispatch(&cmd, Game::handle).await
    }

    /// Gets a game by ID, or None if it was never started.
    pub async fn get_game(&self, game_id: &AggregateId) -> Result<Option<Game>, DomainError> {
        self.handler.load_existing(game_id).await
    }

    /// Returns the stored events of a game, oldest first.
    pub async fn events(&self, game_id: &AggregateId) -> Result<Vec<EventEnvelope>, DomainError> {
        Ok(self.handler.store().get_events_for_aggregate(game_id).await?)
    }
}
