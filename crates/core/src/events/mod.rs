//! Event store use cases and the calendar lifecycle

pub mod capacity;
pub mod lifecycle;
pub mod ports;
pub mod service;

pub use service::{CleanupReport, EventService};
