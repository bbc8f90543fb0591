//! HTTP API server for rock-paper-scissors games.
//!
//! Provides REST endpoints to start games, make moves and query the read
//! models, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use domain::{EventPublisher, GameService};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{EndedGamesView, GameInfoView, OngoingGamesView, Projection, ProjectionProcessor};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::games::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/api/games", get(routes::games::list::<S>))
        .route(
            "/api/games/{id}",
            get(routes::games::get::<S>).put(routes::games::put::<S>),
        )
        .route("/api/games/{id}/events", get(routes::games::events::<S>))
        .route("/api/ongoing-games", get(routes::games::ongoing::<S>))
        .route("/api/ended-games", get(routes::games::ended::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the game service, the projection processor and the three game views.
///
/// The processor is registered as the service's publisher, so the views are
/// up to date by the time a command returns.
pub fn create_default_state<S: EventStore + Clone + 'static>(
    event_store: S,
    config: &Config,
) -> (Arc<AppState<S>>, Arc<ProjectionProcessor<S>>) {
    let game_info = GameInfoView::new();
    let ongoing_games = OngoingGamesView::new();
    let ended_games = EndedGamesView::new();

    let mut processor = ProjectionProcessor::new(event_store.clone());
    processor.register(Box::new(game_info.clone()) as Box<dyn Projection>);
    processor.register(Box::new(ongoing_games.clone()) as Box<dyn Projection>);
    processor.register(Box::new(ended_games.clone()) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    let game_service =
        GameService::new(event_store).with_publisher(processor.clone() as Arc<dyn EventPublisher>);

    let state = Arc::new(AppState {
        game_service,
        game_info,
        ongoing_games,
        ended_games,
        projection_processor: processor.clone(),
        rounds: config.rounds,
    });

    (state, processor)
}
