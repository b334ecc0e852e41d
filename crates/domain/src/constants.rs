//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Pagination
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

// Sortable columns
pub const EVENT_SORT_FIELDS: &[&str] =
    &["start_date", "end_date", "created_at", "updated_at", "title", "capacity", "price"];
pub const VENUE_SORT_FIELDS: &[&str] = &["name", "city", "country", "capacity", "created_at", "updated_at"];

// Calendar mirror
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GOOGLE_OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Refresh the access token this long before it expires.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 300;
pub const CALENDAR_TIME_ZONE: &str = "UTC";

// Reminders
pub const REMINDER_LOOKAHEAD_HOURS: i64 = 24;
pub const REMINDER_WINDOW_HALF_MINUTES: i64 = 30;
pub const DEFAULT_REMINDER_CRON: &str = "0 0 * * * *";
pub const DEFAULT_RECIPIENT_NAME: &str = "Organizer";

// Outbox
pub const DEFAULT_SYNC_MAX_ATTEMPTS: u32 = 5;
pub const MAX_SYNC_BACKOFF_SECS: u64 = 3600;
pub const MAX_ERROR_REASON_LEN: usize = 256;
pub const DEFAULT_OUTBOX_RETENTION_DAYS: u32 = 30;
pub const OUTBOX_PRUNE_BATCH: usize = 1000;

// Maintenance
pub const DEFAULT_CLEANUP_PATTERN: &str = "not-good";
