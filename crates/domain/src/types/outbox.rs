//! Outbox pattern types for calendar synchronization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the sync worker must do with an event's calendar mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// Create the remote copy and record its id.
    Publish,
    /// Update the remote copy, re-creating it when it vanished.
    Upsert,
    /// Remove the remote copy and clear the local mirror id.
    Retract,
    /// Remove the remote copy of an event that no longer exists locally.
    RetractDeleted,
}

crate::impl_status_conversions!(SyncAction {
    Publish => "publish",
    Upsert => "upsert",
    Retract => "retract",
    RetractDeleted => "retract_deleted",
});

/// Outbox entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    #[default]
    Pending,
    Sent,
    Failed,
    Dismissed,
}

crate::impl_status_conversions!(OutboxStatus {
    Pending => "pending",
    Sent => "sent",
    Failed => "failed",
    Dismissed => "dismissed",
});

/// Pending calendar work, written in the same transaction as the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncIntent {
    pub id: String,
    pub event_id: String,
    pub action: SyncAction,
    /// Mirror id captured at enqueue time. Required for `RetractDeleted`.
    pub mirror_id: Option<String>,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub next_attempt_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl SyncIntent {
    /// New pending intent due immediately.
    pub fn new(event_id: impl Into<String>, action: SyncAction, mirror_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            event_id: event_id.into(),
            action,
            mirror_id,
            status: OutboxStatus::Pending,
            attempts: 0,
            last_error: None,
            next_attempt_at: now,
            created_at: now,
            processed_at: None,
        }
    }
}

/// Outbox counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxStats {
    pub pending: u64,
    pub sent: u64,
    pub failed: u64,
    pub dismissed: u64,
}
