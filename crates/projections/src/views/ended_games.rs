//! Ended games read model: outcome records for finished games.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{GameEvent, GameState, PlayerId};
use event_store::EventEnvelope;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode_game_event};
use crate::read_model::ReadModel;

/// Outcome of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndedGame {
    pub game_id: AggregateId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player1: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player2: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
    /// Won or Tied.
    pub state: GameState,
    pub rounds_played: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Read model view of finished games.
///
/// Games are tracked from the moment they start so players are known when
/// the outcome arrives, but only games in a terminal state are visible.
#[derive(Clone)]
pub struct EndedGamesView {
    games: Arc<RwLock<HashMap<AggregateId, EndedGame>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl EndedGamesView {
    /// Creates a new empty ended games view.
    pub fn new() -> Self {
        Self {
            games: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets a finished game; None while it is still in progress.
    pub async fn get_game(&self, game_id: &AggregateId) -> Option<EndedGame> {
        self.games
            .read()
            .await
            .get(game_id)
            .filter(|g| g.state.is_terminal())
            .cloned()
    }

    /// Gets all finished games, most recently ended first.
    pub async fn all_games(&self) -> Vec<EndedGame> {
        let mut games: Vec<_> = self
            .games
            .read()
            .await
            .values()
            .filter(|g| g.state.is_terminal())
            .cloned()
            .collect();
        games.sort_by(|a, b| {
            b.ended_at
                .cmp(&a.ended_at)
                .then_with(|| a.game_id.cmp(&b.game_id))
        });
        games
    }

    /// Gets the games `player` won.
    pub async fn games_won_by(&self, player: &PlayerId) -> Vec<EndedGame> {
        self.all_games()
            .await
            .into_iter()
            .filter(|g| g.winner.as_ref() == Some(player))
            .collect()
    }
}

impl Default for EndedGamesView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for EndedGamesView {
    fn name(&self) -> &'static str {
        "EndedGamesView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if let Some(game_event) = decode_game_event(event)? {
            let game_id = &event.aggregate_id;
            let mut games = self.games.write().await;

            match game_event {
                GameEvent::GameStarted(_) => {
                    games.insert(
                        game_id.clone(),
                        EndedGame {
                            game_id: game_id.clone(),
                            player1: None,
                            player2: None,
                            winner: None,
                            state: GameState::Ongoing,
                            rounds_played: 0,
                            ended_at: None,
                        },
                    );
                }
                GameEvent::FirstPlayerJoined(data) => {
                    if let Some(game) = games.get_mut(game_id) {
                        game.player1 = Some(data.player);
                    }
                }
                GameEvent::SecondPlayerJoined(data) => {
                    if let Some(game) = games.get_mut(game_id) {
                        game.player2 = Some(data.player);
                    }
                }
                GameEvent::RoundEnded(_) => {
                    if let Some(game) = games.get_mut(game_id) {
                        game.rounds_played += 1;
                    }
                }
                GameEvent::GameWon(data) => {
                    if let Some(game) = games.get_mut(game_id) {
                        game.state = GameState::Won;
                        game.winner = Some(data.winner);
                    }
                }
                GameEvent::GameTied => {
                    if let Some(game) = games.get_mut(game_id) {
                        game.state = GameState::Tied;
                    }
                }
                GameEvent::GameEnded => {
                    if let Some(game) = games.get_mut(game_id) {
                        game.ended_at = Some(event.timestamp);
                    }
                }
                _ => {}
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
impl ReadModel for EndedGamesView {
    fn name(&self) -> &'static str {
        "EndedGamesView"
    }

    async fn count(&self) -> usize {
        self.games
            .read()
            .await
            .values()
            .filter(|g| g.state.is_terminal())
            .count()
    }
}
