//! Read models and projections for the query side.
//!
//! This crate provides:
//! - [`Projection`] trait for processing events into read models
//! - [`ReadModel`] trait for query access to denormalized data
//! - [`ProjectionProcessor`] for delivering committed events to projections
//!   and rebuilding them from the full log
//! - Three game views: game info, ongoing games, ended games

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{EndedGame, EndedGamesView, GameInfoView, GameView, OngoingGame, OngoingGamesView};
