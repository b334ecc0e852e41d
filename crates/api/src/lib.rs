//! # EventHub API
//!
//! HTTP application layer - routes, auth and main entry point.
//!
//! This crate contains:
//! - axum routes for venues, events, the calendar webhook and admin jobs
//! - Application context (dependency injection)
//! - Bearer token authentication
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Owns the process lifecycle of background jobs

pub mod auth;
pub mod context;
pub mod routes;
pub mod utils;

// Re-export for convenience
pub use context::*;
pub use routes::router;
