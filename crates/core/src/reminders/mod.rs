//! Event reminders

pub mod message;
pub mod ports;
pub mod service;

pub use ports::{ReminderMessage, ReminderNotifier};
pub use service::{reminder_window, ReminderCandidate, ReminderReport, ReminderService};
