//! Game aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod player;
mod round;
mod rules;
mod service;
mod state;

pub use aggregate::Game;
pub use commands::{DEFAULT_ROUNDS, GameCommand, MakeMove, StartGame};
pub use events::{
    GameEvent, GameStartedData, GameWonData, MoveMadeData, PlayerJoinedData, RoundData,
    RoundWonData,
};
pub use player::{PlayerId, PlayerMove, PlayerSlot};
pub use round::{Round, RoundOutcome};
pub use rules::{Move, ParseMoveError, resolve};
pub use service::GameService;
pub use state::{GameState, ParseGameStateError, TerminationPolicy};

use thiserror::Error;

/// Errors that can occur during game operations.
#[derive(Debug, Error)]
pub enum GameError {
    /// The game is not in a state that allows the action.
    #[error("Invalid state: cannot {action} while game is {current_state}")]
    InvalidState {
        current_state: GameState,
        action: &'static str,
    },

    /// Both seats are taken by other players.
    #[error("Game is full: {player} cannot join a game with two players")]
    Capacity { player: PlayerId },

    /// A stored move names a player who never joined.
    #[error("Unknown player: {player}")]
    UnknownPlayer { player: PlayerId },

    /// A stored move names a round that was never started.
    #[error("Unknown round: {round_number}")]
    UnknownRound { round_number: u32 },

    /// A decided round refers to a seat with no player.
    #[error("No player seated in {slot:?} seat")]
    EmptySeat { slot: PlayerSlot },

    /// Rounds must be at least 1.
    #[error("Invalid number of rounds: {rounds} (must be at least 1)")]
    InvalidRounds { rounds: u32 },
}
