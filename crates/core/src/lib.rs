//! # EventHub Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Venue and event use cases
//! - The event lifecycle state machine and calendar sync processor
//! - Reminder and webhook services
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `eventhub-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod events;
pub mod reminders;
pub mod sync;
pub mod utils;
pub mod venues;
pub mod webhook;

// Re-export specific items to avoid ambiguity
pub use events::ports::EventRepository;
pub use events::{CleanupReport, EventService};
pub use reminders::{ReminderMessage, ReminderNotifier, ReminderReport, ReminderService};
pub use sync::{
    BatchReport, CalendarGateway, CalendarResult, CalendarSyncProcessor, CredentialProvider,
    SyncError, SyncOutbox,
};
pub use venues::ports::VenueRepository;
pub use venues::VenueService;
pub use webhook::{WebhookAck, WebhookNotification, WebhookService};
