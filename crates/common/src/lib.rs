//! Shared types used across the workspace.

pub mod types;

pub use types::AggregateId;
