//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use event_store::EventStore;
use projections::ReadModel;
use serde::Serialize;

use super::games::AppState;

#[derive(Serialize)]
pub struct ReadModelStatus {
    pub name: &'static str,
    pub entries: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub projections: usize,
    pub read_models: Vec<ReadModelStatus>,
}

/// GET /health: returns system health status and read model sizes.
pub async fn check<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    let read_models: [&dyn ReadModel; 3] =
        [&state.game_info, &state.ongoing_games, &state.ended_games];

    let mut statuses = Vec::with_capacity(read_models.len());
    for model in read_models {
        statuses.push(ReadModelStatus {
            name: model.name(),
            entries: model.count().await,
        });
    }

    Json(HealthResponse {
        status: "ok",
        projections: state.projection_processor.projection_count(),
        read_models: statuses,
    })
}
