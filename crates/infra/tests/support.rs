#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use eventhub_domain::{Event, EventStatus, Venue};
use eventhub_infra::database::DbManager;
use eventhub_infra::http::HttpClient;
use tempfile::TempDir;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with the schema applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("eventhub-test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    /// Execute a batch of SQL statements against the database.
    pub fn execute_batch(&self, sql: &str) {
        let conn = self
            .manager
            .get_connection()
            .expect("connection should be available for execute_batch");
        conn.execute_batch(sql).expect("SQL batch execution should succeed");
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client with fast retries for mock servers.
pub fn fast_http() -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(5))
        .max_attempts(2)
        .base_backoff(Duration::from_millis(1))
        .build()
        .expect("http client should build")
}

/// Millisecond precision, matching what the database stores.
pub fn at(offset: ChronoDuration) -> DateTime<Utc> {
    let now = Utc::now() + offset;
    DateTime::from_timestamp_millis(now.timestamp_millis()).expect("timestamp in range")
}

pub fn make_venue(id: &str, owner: &str, name: &str, city: &str) -> Venue {
    let now = at(ChronoDuration::zero());
    Venue {
        id: id.to_string(),
        name: name.to_string(),
        address: "12 Quai Saint-Antoine".into(),
        city: city.to_string(),
        country: "France".into(),
        capacity: 200,
        amenities: vec!["wifi".into(), "stage".into()],
        owner_id: owner.to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn make_event(id: &str, venue: &Venue, title: &str, start: DateTime<Utc>) -> Event {
    let now = at(ChronoDuration::zero());
    Event {
        id: id.to_string(),
        title: title.to_string(),
        description: Some(format!("About {title}")),
        start_date: start,
        end_date: Some(start + ChronoDuration::hours(2)),
        venue_id: venue.id.clone(),
        venue_name: venue.name.clone(),
        venue_address: venue.address.clone(),
        venue_city: venue.city.clone(),
        venue_country: venue.country.clone(),
        capacity: 150,
        available_spots: 140,
        price: Some(25.0),
        currency: Some("EUR".into()),
        status: EventStatus::Draft,
        category: Some("music".into()),
        image_url: None,
        registration_deadline: None,
        requires_approval: false,
        organizer_id: "org-1".into(),
        organizer_name: "Ana Organizer".into(),
        organizer_email: Some("ana@example.com".into()),
        google_calendar_id: None,
        created_at: now,
        updated_at: now,
    }
}
