//! Port interfaces for calendar synchronization

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventhub_domain::{
    CalendarEventPayload, CalendarFailure, OutboxStats, RemoteCalendarEvent, Result, SyncAction,
    SyncIntent,
};

/// Result of a calendar call.
pub type CalendarResult<T> = std::result::Result<T, CalendarFailure>;

/// Durable queue of pending calendar work
#[async_trait]
pub trait SyncOutbox: Send + Sync {
    /// Enqueue an intent outside of an event write
    async fn enqueue(&self, intent: &SyncIntent) -> Result<()>;

    /// Pending intents due at `now`, oldest first
    async fn dequeue_batch(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<SyncIntent>>;

    /// Mark an intent as done
    async fn mark_sent(&self, id: &str) -> Result<()>;

    /// Record a failed attempt and schedule the next one
    async fn mark_retry(&self, id: &str, error: &str, next_attempt_at: DateTime<Utc>) -> Result<()>;

    /// Record a failed attempt and give up
    async fn mark_failed(&self, id: &str, error: &str) -> Result<()>;

    /// Close an intent that needs no remote work
    async fn mark_dismissed(&self, id: &str, reason: &str) -> Result<()>;

    /// Whether a pending intent with `action` is already queued for the event
    async fn has_pending(&self, event_id: &str, action: SyncAction) -> Result<bool>;

    /// Delete up to `limit` closed intents processed before `before`
    async fn prune_closed(&self, before: DateTime<Utc>, limit: usize) -> Result<usize>;

    /// Counts per status
    async fn stats(&self) -> Result<OutboxStats>;
}

/// Bearer credentials for the calendar API
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// A valid access token, refreshed when close to expiry.
    async fn access_token(&self) -> CalendarResult<String>;

    /// Drop any cached token so the next call fetches a fresh one.
    async fn invalidate(&self) {}
}

/// External calendar operations.
///
/// Every call reports failure as a [`CalendarFailure`] instead of an error
/// so callers can branch on the reason.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Whether a target calendar is configured at all.
    fn is_configured(&self) -> bool;

    /// Create a remote event and return its id.
    async fn add(&self, payload: &CalendarEventPayload) -> CalendarResult<String>;

    async fn update(
        &self,
        external_id: &str,
        payload: &CalendarEventPayload,
    ) -> CalendarResult<RemoteCalendarEvent>;

    /// Delete a remote event. An already missing event counts as success.
    async fn delete(&self, external_id: &str) -> CalendarResult<()>;

    /// Fetch a remote event. `Ok(None)` when it is gone.
    async fn find(&self, external_id: &str) -> CalendarResult<Option<RemoteCalendarEvent>>;
}
