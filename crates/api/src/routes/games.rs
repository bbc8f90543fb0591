//! Game command and query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, Query, State};
use axum::http::HeaderMap;
use common::AggregateId;
use domain::{GameService, GameState, MakeMove, Move, PlayerId, StartGame};
use event_store::EventStore;
use projections::{
    EndedGame, EndedGamesView, GameInfoView, GameView, OngoingGame, OngoingGamesView,
    ProjectionProcessor,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Header naming the acting player.
pub const PLAYER_HEADER: &str = "player";

/// Shared application state for game handlers.
pub struct AppState<S: EventStore> {
    pub game_service: GameService<S>,
    pub game_info: GameInfoView,
    pub ongoing_games: OngoingGamesView,
    pub ended_games: EndedGamesView,
    pub projection_processor: Arc<ProjectionProcessor<S>>,
    /// Rounds for games started over HTTP.
    pub rounds: u32,
}

/// Form body (or query string) of a PUT request.
#[derive(Debug, Default, Deserialize)]
pub struct MoveParams {
    #[serde(rename = "move")]
    pub r#move: Option<String>,
}

/// Query parameters for the ongoing games listing.
#[derive(Debug, Default, Deserialize)]
pub struct OngoingParams {
    pub player: Option<String>,
}

/// Query parameters for the ended games listing.
#[derive(Debug, Default, Deserialize)]
pub struct EndedParams {
    pub winner: Option<String>,
}

/// PUT /api/games/{id}: start a game, or make a move when `move` is given.
///
/// The move may arrive as a urlencoded form field or as a query parameter.
#[tracing::instrument(skip(state, headers, query, form))]
pub async fn put<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<MoveParams>,
    form: Result<Form<MoveParams>, FormRejection>,
) -> Result<Json<GameView>, ApiError> {
    let player = player_from_headers(&headers)?;
    let game_id = AggregateId::from(id);

    let requested_move = form
        .ok()
        .and_then(|Form(params)| params.r#move)
        .or(query.r#move)
        .filter(|m| !m.trim().is_empty());

    match requested_move {
        Some(raw) => {
            let r#move: Move = raw.parse()?;
            state
                .game_service
                .make_move(MakeMove::new(game_id.clone(), player, r#move))
                .await?;
        }
        None => {
            state
                .game_service
                .start_game(StartGame::new(game_id.clone(), player, state.rounds))
                .await?;
        }
    }

    // Projections are updated before the command returns.
    let view = state.game_info.find_game(&game_id).await.ok_or_else(|| {
        ApiError::Internal(format!("Game {game_id} missing from read model after command"))
    })?;

    Ok(Json(view))
}

/// GET /api/games: list games, optionally filtered by one or more `state` parameters.
#[tracing::instrument(skip(state))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<GameView>>, ApiError> {
    let states = params
        .iter()
        .filter(|(key, _)| key == "state")
        .flat_map(|(_, value)| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::parse::<GameState>)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(state.game_info.games_in_states(&states).await))
}

/// GET /api/games/{id}: a single game from the read model.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<GameView>, ApiError> {
    let game_id = AggregateId::from(id);
    state
        .game_info
        .find_game(&game_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Game {game_id} not found")))
}

/// Response type for event envelope data.
#[derive(Serialize)]
pub struct EventEnvelopeResponse {
    pub event_id: String,
    pub event_type: String,
    pub aggregate_id: String,
    pub version: i64,
    pub timestamp: String,
    pub payload: serde_json::Value,
}

/// GET /api/games/{id}/events: the stored events of a game, oldest first.
#[tracing::instrument(skip(state))]
pub async fn events<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventEnvelopeResponse>>, ApiError> {
    let game_id = AggregateId::from(id);
    let envelopes = state.game_service.events(&game_id).await?;

    if envelopes.is_empty() {
        return Err(ApiError::NotFound(format!("Game {game_id} not found")));
    }

    let responses = envelopes
        .into_iter()
        .map(|e| EventEnvelopeResponse {
            event_id: e.event_id.to_string(),
            event_type: e.event_type,
            aggregate_id: e.aggregate_id.into_inner(),
            version: e.version.as_i64(),
            timestamp: e.timestamp.to_rfc3339(),
            payload: e.payload,
        })
        .collect();

    Ok(Json(responses))
}

/// GET /api/ongoing-games: games in progress, optionally only those `player` sits in.
#[tracing::instrument(skip(state))]
pub async fn ongoing<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<OngoingParams>,
) -> Json<Vec<OngoingGame>> {
    let games = match params.player {
        Some(player) => {
            state
                .ongoing_games
                .games_for_player(&PlayerId::from(player))
                .await
        }
        None => state.ongoing_games.all_games().await,
    };
    Json(games)
}

/// GET /api/ended-games: finished games, newest first, optionally only those won by `winner`.
#[tracing::instrument(skip(state))]
pub async fn ended<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<EndedParams>,
) -> Json<Vec<EndedGame>> {
    let games = match params.winner {
        Some(winner) => state.ended_games.games_won_by(&PlayerId::from(winner)).await,
        None => state.ended_games.all_games().await,
    };
    Json(games)
}

fn player_from_headers(headers: &HeaderMap) -> Result<PlayerId, ApiError> {
    let value = headers
        .get(PLAYER_HEADER)
        .ok_or_else(|| ApiError::BadRequest(format!("Missing '{PLAYER_HEADER}' header")))?;

    let player = value
        .to_str()
        .map_err(|_| ApiError::BadRequest(format!("Invalid '{PLAYER_HEADER}' header")))?
        .trim();

    if player.is_empty() {
        return Err(ApiError::BadRequest(format!("Empty '{PLAYER_HEADER}' header")));
    }

    Ok(PlayerId::from(player))
}
