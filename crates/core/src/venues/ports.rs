//! Port interfaces for venue storage

use async_trait::async_trait;
use eventhub_domain::{Page, Result, Venue, VenueQuery};

/// Venue persistence
#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn insert(&self, venue: &Venue) -> Result<()>;

    /// Returns `false` when the venue does not exist.
    async fn update(&self, venue: &Venue) -> Result<bool>;

    /// Returns `false` when the venue does not exist.
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Venue>>;

    async fn search(&self, query: &VenueQuery) -> Result<Page<Venue>>;
}
