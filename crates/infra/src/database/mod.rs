//! Database implementations

pub mod event_repository;
pub mod manager;
pub mod outbox_repository;
mod sql;
pub mod venue_repository;

pub use event_repository::SqliteEventRepository;
pub use manager::{DbConnection, DbManager};
pub use outbox_repository::SqliteOutboxRepository;
pub use venue_repository::SqliteVenueRepository;
