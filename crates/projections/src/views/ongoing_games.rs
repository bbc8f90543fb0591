//! Ongoing games read model: games that have started and not yet ended.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use domain::{GameEvent, PlayerId};
use event_store::EventEnvelope;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode_game_event};
use crate::read_model::ReadModel;

/// Summary of a game in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OngoingGame {
    pub game_id: AggregateId,
    pub started_by: PlayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player1: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player2: Option<PlayerId>,
    pub joinable: bool,
    /// Configured number of rounds.
    pub rounds: u32,
    /// Latest round opened; 0 before the first move.
    pub current_round: u32,
}

/// Read model view of games in progress.
///
/// Games are removed from this view on GameEnded.
#[derive(Clone)]
pub struct OngoingGamesView {
    games: Arc<RwLock<HashMap<AggregateId, OngoingGame>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl OngoingGamesView {
    /// Creates a new empty ongoing games view.
    pub fn new() -> Self {
        Self {
            games: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets an ongoing game; None once it has ended.
    pub async fn get_game(&self, game_id: &AggregateId) -> Option<OngoingGame> {
        self.games.read().await.get(game_id).cloned()
    }

    /// Gets all ongoing games, ordered by game ID.
    pub async fn all_games(&self) -> Vec<OngoingGame> {
        let mut games: Vec<_> = self.games.read().await.values().cloned().collect();
        games.sort_by(|a, b| a.game_id.cmp(&b.game_id));
        games
    }

    /// Gets the ongoing games `player` is seated in.
    pub async fn games_for_player(&self, player: &PlayerId) -> Vec<OngoingGame> {
        let mut games: Vec<_> = self
            .games
            .read()
            .await
            .values()
            .filter(|g| g.player1.as_ref() == Some(player) || g.player2.as_ref() == Some(player))
            .cloned()
            .collect();
        games.sort_by(|a, b| a.game_id.cmp(&b.game_id));
        games
    }
}

impl Default for OngoingGamesView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for OngoingGamesView {
    fn name(&self) -> &'static str {
        "OngoingGamesView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if let Some(game_event) = decode_game_event(event)? {
            let game_id = &event.aggregate_id;
            let mut games = self.games.write().await;

            match game_event {
                GameEvent::GameStarted(data) => {
                    games.insert(
                        game_id.clone(),
                        OngoingGame {
                            game_id: game_id.clone(),
                            started_by: data.started_by,
                            player1: None,
                            player2: None,
                            joinable: true,
                            rounds: data.rounds,
                            current_round: 0,
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
                        game.joinable = false;
                    }
                }
                GameEvent::RoundStarted(data) => {
                    if let Some(game) = games.get_mut(game_id) {
                        game.current_round = data.round_number;
                    }
                }
                GameEvent::GameEnded => {
                    games.remove(game_id);
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
impl ReadModel for OngoingGamesView {
    fn name(&self) -> &'static str {
        "OngoingGamesView"
    }

    async fn count(&self) -> usize {
        self.games.read().await.len()
    }
}
