//! Domain layer for the rock-paper-scissors engine.
//!
//! This crate provides:
//! - Aggregate trait for event-sourced entities
//! - DomainEvent trait for domain events
//! - Command trait and CommandHandler for serialized, retried command dispatch
//! - EventPublisher port through which committed events reach read models
//! - Game aggregate with its round and move rules

pub mod aggregate;
pub mod command;
pub mod error;
pub mod game;
pub mod publisher;

mod locks;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::DomainError;
pub use game::{
    DEFAULT_ROUNDS, Game, GameCommand, GameError, GameEvent, GameService, GameState, MakeMove,
    Move, ParseGameStateError, ParseMoveError, PlayerId, PlayerMove, PlayerSlot, Round,
    RoundOutcome, StartGame, TerminationPolicy,
};
pub use publisher::{EventPublisher, PublishError};
