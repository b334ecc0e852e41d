//! Port interfaces for event storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventhub_domain::{Event, EventQuery, Page, Result, SyncIntent, Venue};

/// Event persistence.
///
/// Writes that carry a [`SyncIntent`] must store it in the same transaction
/// as the event row.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a new event.
    async fn insert(&self, event: &Event, intent: Option<&SyncIntent>) -> Result<()>;

    /// Overwrite an event's fields. The mirror id column is left untouched.
    /// Returns `false` when the event does not exist.
    async fn update(&self, event: &Event, intent: Option<&SyncIntent>) -> Result<bool>;

    /// Hard delete. Returns `false` when the event does not exist.
    async fn delete(&self, id: &str, intent: Option<&SyncIntent>) -> Result<bool>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>>;

    /// Event whose calendar mirror has the given id.
    async fn find_by_mirror_id(&self, mirror_id: &str) -> Result<Option<Event>>;

    async fn search(&self, query: &EventQuery) -> Result<Page<Event>>;

    /// Published events starting within `[start, end]`, inclusive.
    async fn find_published_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>>;

    /// Every event, oldest first.
    async fn list_all(&self) -> Result<Vec<Event>>;

    /// Targeted write of the calendar mirror id. Returns `false` when the
    /// event does not exist.
    async fn set_mirror_id(&self, id: &str, mirror_id: Option<&str>) -> Result<bool>;

    /// Copy the venue's fields onto every event at that venue starting after
    /// `after`. Refreshed events that are published with a mirror id get an
    /// `Upsert` intent in the same transaction. Returns the refreshed events.
    async fn refresh_venue_snapshot(&self, venue: &Venue, after: DateTime<Utc>)
        -> Result<Vec<Event>>;
}
