//! Helpers shared by the SQLite repositories.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eventhub_domain::{EventHubError, Result, SortDirection, SortSpec};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use tokio::task;

use super::manager::DbManager;

/// Run `work` on a pooled connection inside `spawn_blocking`.
pub(crate) async fn with_connection<T, F>(db: &Arc<DbManager>, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
{
    let db = Arc::clone(db);
    task::spawn_blocking(move || {
        let mut conn = db.get_connection()?;
        work(&mut conn)
    })
    .await
    .map_err(map_join_error)?
}

/// Epoch milliseconds for storage.
pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Read an epoch-millisecond column.
pub(crate) fn millis_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: i64 = row.get(idx)?;
    from_millis(idx, raw)
}

/// Read a nullable epoch-millisecond column.
pub(crate) fn opt_millis_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<i64>>(idx)?.map(|raw| from_millis(idx, raw)).transpose()
}

fn from_millis(idx: usize, raw: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {raw}").into(),
        )
    })
}

/// Parse a stored enum string, reporting the column on failure.
pub(crate) fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into()))
}

/// `%term%` with LIKE wildcards escaped, for use with `ESCAPE '\'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// `ORDER BY` clause for a whitelisted column, `fallback` otherwise.
/// Ties are broken by id so pages are stable.
pub(crate) fn order_clause(sort: &SortSpec, allowed: &[&str], fallback: &str) -> String {
    let column = allowed
        .iter()
        .find(|column| **column == sort.field)
        .copied()
        .unwrap_or(fallback);
    let direction = match sort.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    format!("ORDER BY {column} {direction}, id {direction}")
}

pub(crate) fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub(crate) fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn map_join_error(err: task::JoinError) -> EventHubError {
    if err.is_cancelled() {
        EventHubError::Internal("database task cancelled".into())
    } else {
        EventHubError::Internal(format!("database task panic: {err}"))
    }
}
