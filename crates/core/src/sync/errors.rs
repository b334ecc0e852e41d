//! Sync-specific error types
//!
//! Classifies calendar failures with retry metadata.

use std::time::Duration;

use eventhub_domain::constants::MAX_SYNC_BACKOFF_SECS;
use eventhub_domain::{CalendarFailure, EventHubError};
use rand::Rng;
use thiserror::Error;

/// Categories of sync errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorCategory {
    /// 401, 403 - retryable; a 401 drops the cached token first
    Authentication,
    /// 429 - retry after the rate window
    RateLimit,
    /// 5xx - retryable
    Server,
    /// Other 4xx - terminal
    Client,
    /// Transport failures - retryable
    Network,
    /// Local storage failures - retryable
    Database,
    /// Missing configuration - terminal
    Config,
}

/// Calendar sync errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl SyncError {
    /// Get the error category for this error
    pub const fn category(&self) -> SyncErrorCategory {
        match self {
            Self::Auth(_) => SyncErrorCategory::Authentication,
            Self::RateLimit(_) => SyncErrorCategory::RateLimit,
            Self::Server(_) => SyncErrorCategory::Server,
            Self::Client(_) => SyncErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => SyncErrorCategory::Network,
            Self::Database(_) => SyncErrorCategory::Database,
            Self::Config(_) => SyncErrorCategory::Config,
        }
    }

    /// Check if this error should be retried
    pub const fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            SyncErrorCategory::Authentication
                | SyncErrorCategory::RateLimit
                | SyncErrorCategory::Server
                | SyncErrorCategory::Network
                | SyncErrorCategory::Database
        )
    }

    /// Base retry delay in seconds
    pub const fn retry_delay_secs(&self) -> u64 {
        match self.category() {
            SyncErrorCategory::Authentication | SyncErrorCategory::Network => 5,
            SyncErrorCategory::RateLimit => 60,
            SyncErrorCategory::Server => 10,
            SyncErrorCategory::Database => 2,
            SyncErrorCategory::Client | SyncErrorCategory::Config => 0,
        }
    }

    /// Delay before retry number `attempt` (1-based): the base delay doubled
    /// per previous attempt, capped, plus up to 10% jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.retry_delay_secs();
        if base == 0 {
            return Duration::ZERO;
        }
        let exp = attempt.saturating_sub(1).min(16);
        let secs = base.saturating_mul(1u64 << exp).min(MAX_SYNC_BACKOFF_SECS);
        let jitter_ms = rand::thread_rng().gen_range(0..=secs * 100);
        Duration::from_secs(secs) + Duration::from_millis(jitter_ms)
    }
}

impl From<CalendarFailure> for SyncError {
    fn from(failure: CalendarFailure) -> Self {
        match failure {
            CalendarFailure::NotConfigured => Self::Config("calendar not configured".to_string()),
            CalendarFailure::NoGoogleCalendarId => {
                Self::Client("event has no calendar id".to_string())
            }
            CalendarFailure::Exception { message } => Self::Network(message),
            CalendarFailure::ApiError { status, message } => {
                let message = format!("{status}: {message}");
                match status {
                    401 | 403 => Self::Auth(message),
                    429 => Self::RateLimit(message),
                    500..=599 => Self::Server(message),
                    _ => Self::Client(message),
                }
            }
        }
    }
}

impl From<EventHubError> for SyncError {
    fn from(err: EventHubError) -> Self {
        match err {
            EventHubError::Database(message) => Self::Database(message),
            EventHubError::Config(message) => Self::Config(message),
            EventHubError::Network(message) => Self::Network(message),
            EventHubError::Internal(message) => Self::Server(message),
            other => Self::Client(other.to_string()),
        }
    }
}
