//! Calendar synchronization through the transactional outbox

pub mod errors;
pub mod ports;
pub mod processor;

pub use errors::{SyncError, SyncErrorCategory};
pub use ports::{CalendarGateway, CalendarResult, CredentialProvider, SyncOutbox};
pub use processor::{truncate_reason, BatchReport, CalendarSyncProcessor, IntentOutcome};
