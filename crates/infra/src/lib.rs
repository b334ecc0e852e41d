//! # EventHub Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories and the calendar sync outbox
//! - Google Calendar and Brevo clients on a shared HTTP client
//! - The outbox worker and the reminder scheduler
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `eventhub-core`
//! - Contains all "impure" code (I/O, network, timers)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod scheduling;
pub mod sync;

// Re-export commonly used items
pub use database::*;
pub use errors::InfraError;
pub use http::*;
pub use integrations::*;
pub use scheduling::{ReminderScheduler, ReminderSchedulerConfig, SchedulerError};
pub use sync::{OutboxWorker, OutboxWorkerConfig};
