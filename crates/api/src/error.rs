//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, GameError, ParseGameStateError, ParseMoveError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    /// Returns the status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(err) => domain_error_status(err),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg,
            ApiError::Domain(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, "domain error");
                }
                err.to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                msg
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Game(game_err) => match game_err {
            GameError::InvalidState { .. } | GameError::Capacity { .. } => StatusCode::CONFLICT,
            GameError::InvalidRounds { .. } => StatusCode::BAD_REQUEST,
            GameError::UnknownPlayer { .. }
            | GameError::UnknownRound { .. }
            | GameError::EmptySeat { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        },
        err if err.is_conflict() => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<ParseMoveError> for ApiError {
    fn from(err: ParseMoveError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ParseGameStateError> for ApiError {
    fn from(err: ParseGameStateError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AggregateId;
    use domain::{GameState, PlayerId};
    use event_store::{EventStoreError, Version};

    #[test]
    fn game_rejections_map_to_client_errors() {
        let invalid_state = ApiError::from(DomainError::from(GameError::InvalidState {
            current_state: GameState::Won,
            action: "make a move",
        }));
        assert_eq!(invalid_state.status(), StatusCode::CONFLICT);

        let full = ApiError::from(DomainError::from(GameError::Capacity {
            player: PlayerId::from("carol"),
        }));
        assert_eq!(full.status(), StatusCode::CONFLICT);

        let rounds = ApiError::from(DomainError::from(GameError::InvalidRounds { rounds: 0 }));
        assert_eq!(rounds.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn concurrency_conflict_maps_to_409() {
        let err = ApiError::from(DomainError::from(EventStoreError::ConcurrencyConflict {
            aggregate_id: AggregateId::from("game-1"),
            expected: Version::new(1),
            actual: Version::new(2),
        }));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn corrupt_stream_is_a_server_error() {
        let err = ApiError::from(DomainError::CorruptStream {
            aggregate_id: AggregateId::from("game-1"),
            reason: "Unknown player: mallory".to_string(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn parse_errors_are_bad_requests() {
        let err: ApiError = "lizard".parse::<domain::Move>().unwrap_err().into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
