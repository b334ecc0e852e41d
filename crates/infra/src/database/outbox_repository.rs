//! SQLite-backed calendar sync outbox.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventhub_core::SyncOutbox;
use eventhub_domain::{OutboxStats, OutboxStatus, Result, SyncAction, SyncIntent};
use rusqlite::{params, Connection, Row};
use tracing::warn;

use super::manager::{map_sql_error, DbManager};
use super::sql::{millis_column, opt_millis_column, parse_column, to_millis, to_u64, with_connection};

/// Outbox queue on the shared pool.
pub struct SqliteOutboxRepository {
    db: Arc<DbManager>,
}

impl SqliteOutboxRepository {
    /// Construct a repository backed by the shared manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Every intent recorded for an event, oldest first.
    pub async fn intents_for_event(&self, event_id: &str) -> Result<Vec<SyncIntent>> {
        let event_id = event_id.to_string();
        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {OUTBOX_COLUMNS} FROM calendar_sync_outbox
                     WHERE event_id = ?1 ORDER BY created_at ASC, id ASC"
                ))
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![event_id], map_intent_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error);
            rows
        })
        .await
    }

    async fn execute(&self, sql: &'static str, id: &str, error: Option<&str>, at: i64) -> Result<()> {
        let id = id.to_string();
        let error = error.map(str::to_owned);
        with_connection(&self.db, move |conn| {
            let changed = conn.execute(sql, params![id, error, at]).map_err(map_sql_error)?;
            if changed == 0 {
                warn!(intent_id = %id, "Outbox intent not found for status update");
            }
            Ok(())
        })
        .await
    }
}

/// Insert an intent on an existing connection or transaction.
pub(crate) fn insert_intent(conn: &Connection, intent: &SyncIntent) -> Result<()> {
    conn.execute(
        OUTBOX_INSERT_SQL,
        params![
            intent.id,
            intent.event_id,
            intent.action.as_str(),
            intent.mirror_id,
            intent.status.as_str(),
            intent.attempts,
            intent.last_error,
            to_millis(intent.next_attempt_at),
            to_millis(intent.created_at),
            intent.processed_at.map(to_millis),
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

#[async_trait]
impl SyncOutbox for SqliteOutboxRepository {
    async fn enqueue(&self, intent: &SyncIntent) -> Result<()> {
        let intent = intent.clone();
        with_connection(&self.db, move |conn| insert_intent(conn, &intent)).await
    }

    async fn dequeue_batch(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<SyncIntent>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        with_connection(&self.db, move |conn| {
            let mut stmt = conn.prepare(OUTBOX_DEQUEUE_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![to_millis(now), limit], map_intent_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error);
            rows
        })
        .await
    }

    async fn mark_sent(&self, id: &str) -> Result<()> {
        self.execute(MARK_SENT_SQL, id, None, to_millis(Utc::now())).await
    }

    async fn mark_retry(&self, id: &str, error: &str, next_attempt_at: DateTime<Utc>) -> Result<()> {
        self.execute(MARK_RETRY_SQL, id, Some(error), to_millis(next_attempt_at)).await
    }

    async fn mark_failed(&self, id: &str, error: &str) -> Result<()> {
        self.execute(MARK_FAILED_SQL, id, Some(error), to_millis(Utc::now())).await
    }

    async fn mark_dismissed(&self, id: &str, reason: &str) -> Result<()> {
        self.execute(MARK_DISMISSED_SQL, id, Some(reason), to_millis(Utc::now())).await
    }

    async fn has_pending(&self, event_id: &str, action: SyncAction) -> Result<bool> {
        let event_id = event_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(OUTBOX_HAS_PENDING_SQL, params![event_id, action.as_str()], |row| {
                row.get::<_, bool>(0)
            })
            .map_err(map_sql_error)
        })
        .await
    }

    async fn prune_closed(&self, before: DateTime<Utc>, limit: usize) -> Result<usize> {
        if limit == 0 {
            return Ok(0);
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        with_connection(&self.db, move |conn| {
            conn.execute(OUTBOX_PRUNE_SQL, params![to_millis(before), limit]).map_err(map_sql_error)
        })
        .await
    }

    async fn stats(&self) -> Result<OutboxStats> {
        with_connection(&self.db, |conn| {
            let mut stmt = conn
                .prepare("SELECT status, COUNT(*) FROM calendar_sync_outbox GROUP BY status")
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map([], |row| Ok((parse_column::<OutboxStatus>(row, 0)?, row.get::<_, i64>(1)?)))
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            let mut stats = OutboxStats::default();
            for (status, count) in rows {
                let count = to_u64(count);
                match status {
                    OutboxStatus::Pending => stats.pending = count,
                    OutboxStatus::Sent => stats.sent = count,
                    OutboxStatus::Failed => stats.failed = count,
                    OutboxStatus::Dismissed => stats.dismissed = count,
                }
            }
            Ok(stats)
        })
        .await
    }
}

const OUTBOX_COLUMNS: &str = "id, event_id, action, mirror_id, status, attempts, last_error,
        next_attempt_at, created_at, processed_at";

const OUTBOX_INSERT_SQL: &str = "INSERT INTO calendar_sync_outbox (
        id, event_id, action, mirror_id, status, attempts, last_error,
        next_attempt_at, created_at, processed_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

const OUTBOX_DEQUEUE_SQL: &str = "SELECT
        id, event_id, action, mirror_id, status, attempts, last_error,
        next_attempt_at, created_at, processed_at
    FROM calendar_sync_outbox
    WHERE status = 'pending' AND next_attempt_at <= ?1
    ORDER BY created_at ASC, id ASC
    LIMIT ?2";

const OUTBOX_HAS_PENDING_SQL: &str = "SELECT EXISTS(
        SELECT 1 FROM calendar_sync_outbox
        WHERE event_id = ?1 AND action = ?2 AND status = 'pending'
    )";

const OUTBOX_PRUNE_SQL: &str = "DELETE FROM calendar_sync_outbox WHERE id IN (
        SELECT id FROM calendar_sync_outbox
        WHERE status IN ('sent', 'dismissed', 'failed') AND processed_at < ?1
        LIMIT ?2
    )";

// Each takes (?1 id, ?2 error, ?3 timestamp).
const MARK_SENT_SQL: &str = "UPDATE calendar_sync_outbox
    SET status = 'sent', last_error = ?2, processed_at = ?3
    WHERE id = ?1";

const MARK_RETRY_SQL: &str = "UPDATE calendar_sync_outbox
    SET attempts = attempts + 1, last_error = ?2, next_attempt_at = ?3
    WHERE id = ?1";

const MARK_FAILED_SQL: &str = "UPDATE calendar_sync_outbox
    SET status = 'failed', attempts = attempts + 1, last_error = ?2, processed_at = ?3
    WHERE id = ?1";

const MARK_DISMISSED_SQL: &str = "UPDATE calendar_sync_outbox
    SET status = 'dismissed', last_error = ?2, processed_at = ?3
    WHERE id = ?1";

fn map_intent_row(row: &Row<'_>) -> rusqlite::Result<SyncIntent> {
    Ok(SyncIntent {
        id: row.get(0)?,
        event_id: row.get(1)?,
        action: parse_column::<SyncAction>(row, 2)?,
        mirror_id: row.get(3)?,
        status: parse_column::<OutboxStatus>(row, 4)?,
        attempts: row.get(5)?,
        last_error: row.get(6)?,
        next_attempt_at: millis_column(row, 7)?,
        created_at: millis_column(row, 8)?,
        processed_at: opt_millis_column(row, 9)?,
    })
}
