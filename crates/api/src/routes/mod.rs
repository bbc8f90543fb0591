//! HTTP route handlers.

pub mod games;
pub mod health;
pub mod metrics;
