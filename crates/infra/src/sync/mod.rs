//! Background delivery of calendar sync intents

pub mod outbox_worker;

pub use outbox_worker::{OutboxWorker, OutboxWorkerConfig};
