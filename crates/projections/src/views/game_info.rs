//! Game info read model: one summary per game, whatever its state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use domain::{GameEvent, GameState, PlayerId};
use event_store::EventEnvelope;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode_game_event};
use crate::read_model::ReadModel;

/// Query-side summary of a game.
///
/// Unset players and winner are left out of the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub game_id: AggregateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
    pub state: GameState,
    /// True from GameStarted until a second player is seated.
    pub joinable: bool,
}

impl GameView {
    fn started(game_id: AggregateId) -> Self {
        Self {
            game_id,
            player1: None,
            player2: None,
            winner: None,
            state: GameState::Ongoing,
            joinable: true,
        }
    }

    pub fn has_state(&self, state: GameState) -> bool {
        self.state == state
    }
}

/// Read model view of every known game.
#[derive(Clone)]
pub struct GameInfoView {
    games: Arc<RwLock<HashMap<AggregateId, GameView>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl GameInfoView {
    /// Creates a new empty game info view.
    pub fn new() -> Self {
        Self {
            games: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets a single game.
    pub async fn find_game(&self, game_id: &AggregateId) -> Option<GameView> {
        self.games.read().await.get(game_id).cloned()
    }

    /// Gets every game matching `predicate`, ordered by game ID.
    pub async fn find_games<F>(&self, predicate: F) -> Vec<GameView>
    where
        F: Fn(&GameView) -> bool,
    {
        let mut games: Vec<_> = self
            .games
            .read()
            .await
            .values()
            .filter(|game| predicate(game))
            .cloned()
            .collect();
        games.sort_by(|a, b| a.game_id.cmp(&b.game_id));
        games
    }

    /// Gets all games, ordered by game ID.
    pub async fn all_games(&self) -> Vec<GameView> {
        self.find_games(|_| true).await
    }

    /// Gets games in any of `states`. An empty slice matches every game.
    pub async fn games_in_states(&self, states: &[GameState]) -> Vec<GameView> {
        self.find_games(|game| states.is_empty() || states.contains(&game.state))
            .await
    }

    /// Gets games still waiting for a second player.
    pub async fn joinable_games(&self) -> Vec<GameView> {
        self.find_games(|game| game.joinable).await
    }
}

impl Default for GameInfoView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for GameInfoView {
    fn name(&self) -> &'static str {
        "GameInfoView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if let Some(game_event) = decode_game_event(event)? {
            let game_id = &event.aggregate_id;
            let mut games = self.games.write().await;

            match game_event {
                GameEvent::GameStarted(_) => {
                    games.insert(game_id.clone(), GameView::started(game_id.clone()));
                }
                GameEvent::FirstPlayerJoined(data) => {
                    if let Some(game) = games.get_mut(game_id) {
                        game.player1 = Some(data.player);
                    }
                }
                GameEvent::SecondPlayerJoined(data) => {
                    if let Some(game) = games.get_mut(game_id) {
                        game.player2 = Some(data.player);
                        game.joinable = false;
                    }
                }
                GameEvent::GameWon(data) => {
                    if let Some(game) = games.get_mut(game_id) {
                        game.state = GameState::Won;
                        game.winner = Some(data.winner);
                        game.joinable = false;
                    }
                }
                GameEvent::GameTied => {
                    if let Some(game) = games.get_mut(game_id) {
                        game.state = GameState::Tied;
                        game.joinable = false;
                    }
                }
                GameEvent::RoundStarted(_)
                | GameEvent::MoveMade(_)
                | GameEvent::RoundWon(_)
                | GameEvent::RoundTied(_)
                | GameEvent::RoundEnded(_)
                | GameEvent::GameEnded => {}
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.games.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

#[async_trait]
impl ReadModel for GameInfoView {
    fn name(&self) -> &'static str {
        "GameInfoView"
    }

    async fn count(&self) -> usize {
        self.games.read().await.len()
    }
}
