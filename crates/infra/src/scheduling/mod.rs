//! Cron-based background jobs
//!
//! Schedulers share one lifecycle shape: explicit start/stop, tracked join
//! handles, a cancellation token and timeouts around every async step.

pub mod error;
pub mod reminder_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use reminder_scheduler::{ReminderScheduler, ReminderSchedulerConfig};
