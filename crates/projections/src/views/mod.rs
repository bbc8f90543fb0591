//! Read model views over game events.

pub mod ended_games;
pub mod game_info;
pub mod ongoing_games;

pub use ended_games::{EndedGame, EndedGamesView};
pub use game_info::{GameInfoView, GameView};
pub use ongoing_games::{OngoingGame, OngoingGamesView};
