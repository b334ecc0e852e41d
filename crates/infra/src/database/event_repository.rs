//! SQLite-backed event repository.
//!
//! Writes that carry a sync intent insert it into `calendar_sync_outbox` in
//! the same transaction as the event row.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventhub_core::events::lifecycle::intent_for;
use eventhub_core::EventRepository;
use eventhub_domain::constants::EVENT_SORT_FIELDS;
use eventhub_domain::{
    Event, EventQuery, EventStatus, Page, Result, SyncAction, SyncIntent, Venue,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::debug;

use super::manager::{map_sql_error, DbManager};
use super::outbox_repository::insert_intent;
use super::sql::{
    like_pattern, millis_column, opt_millis_column, order_clause, parse_column, to_i64,
    to_millis, to_u64, with_connection,
};

/// Event storage on the shared pool.
pub struct SqliteEventRepository {
    db: Arc<DbManager>,
}

impl SqliteEventRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn select_where(
        conn: &Connection,
        clause: &str,
        values: &[Value],
    ) -> Result<Vec<Event>> {
        let mut stmt = conn
            .prepare(&format!("SELECT {EVENT_COLUMNS} FROM events {clause}"))
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), map_event_row)
            .map_err(map_sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sql_error);
        rows
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn insert(&self, event: &Event, intent: Option<&SyncIntent>) -> Result<()> {
        let event = event.clone();
        let intent = intent.cloned();
        with_connection(&self.db, move |conn| {
            let tx = conn.transaction().map_err(map_sql_error)?;
            tx.execute(
                EVENT_INSERT_SQL,
                params![
                    event.id,
                    event.title,
                    event.description,
                    to_millis(event.start_date),
                    event.end_date.map(to_millis),
                    event.venue_id,
                    event.venue_name,
                    event.venue_address,
                    event.venue_city,
                    event.venue_country,
                    event.capacity,
                    event.available_spots,
                    event.price,
                    event.currency,
                    event.status.as_str(),
                    event.category,
                    event.image_url,
                    event.registration_deadline.map(to_millis),
                    event.requires_approval,
                    event.organizer_id,
                    event.organizer_name,
                    event.organizer_email,
                    event.google_calendar_id,
                    to_millis(event.created_at),
                    to_millis(event.updated_at),
                ],
            )
            .map_err(map_sql_error)?;
            if let Some(intent) = &intent {
                insert_intent(&tx, intent)?;
            }
            tx.commit().map_err(map_sql_error)
        })
        .await
    }

    async fn update(&self, event: &Event, intent: Option<&SyncIntent>) -> Result<bool> {
        let event = event.clone();
        let intent = intent.cloned();
        with_connection(&self.db, move |conn| {
            let tx = conn.transaction().map_err(map_sql_error)?;
            let changed = tx
                .execute(
                    EVENT_UPDATE_SQL,
                    params![
                        event.id,
                        event.title,
                        event.description,
                        to_millis(event.start_date),
                        event.end_date.map(to_millis),
                        event.venue_id,
                        event.venue_name,
                        event.venue_address,
                        event.venue_city,
                        event.venue_country,
                        event.capacity,
                        event.available_spots,
                        event.price,
                        event.currency,
                        event.status.as_str(),
                        event.category,
                        event.image_url,
                        event.registration_deadline.map(to_millis),
                        event.requires_approval,
                        to_millis(event.updated_at),
                    ],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Ok(false);
            }
            if let Some(intent) = &intent {
                insert_intent(&tx, intent)?;
            }
            tx.commit().map_err(map_sql_error)?;
            Ok(true)
        })
        .await
    }

    async fn delete(&self, id: &str, intent: Option<&SyncIntent>) -> Result<bool> {
        let id = id.to_string();
        let intent = intent.cloned();
        with_connection(&self.db, move |conn| {
            let tx = conn.transaction().map_err(map_sql_error)?;
            let changed =
                tx.execute("DELETE FROM events WHERE id = ?1", params![id]).map_err(map_sql_error)?;
            if changed == 0 {
                return Ok(false);
            }
            if let Some(intent) = &intent {
                insert_intent(&tx, intent)?;
            }
            tx.commit().map_err(map_sql_error)?;
            Ok(true)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>> {
        let id = id.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
                params![id],
                map_event_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    async fn find_by_mirror_id(&self, mirror_id: &str) -> Result<Option<Event>> {
        let mirror_id = mirror_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE google_calendar_id = ?1"),
                params![mirror_id],
                map_event_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    async fn search(&self, query: &EventQuery) -> Result<Page<Event>> {
        let query = query.clone();
        with_connection(&self.db, move |conn| {
            let (where_clause, mut values) = event_filter(&query);

            let total: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM events {where_clause}"),
                    params_from_iter(values.iter()),
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;

            let order = order_clause(&query.sort, EVENT_SORT_FIELDS, "start_date");
            values.push(Value::Integer(i64::from(query.limit)));
            values.push(Value::Integer(to_i64(query.offset)));
            let limit_idx = values.len() - 1;

            let items = Self::select_where(
                conn,
                &format!("{where_clause} {order} LIMIT ?{limit_idx} OFFSET ?{}", limit_idx + 1),
                &values,
            )?;
            Ok(Page { items, total: to_u64(total) })
        })
        .await
    }

    async fn find_published_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        with_connection(&self.db, move |conn| {
            Self::select_where(
                conn,
                "WHERE status = 'published' AND start_date BETWEEN ?1 AND ?2 ORDER BY start_date ASC, id ASC",
                &[Value::Integer(to_millis(start)), Value::Integer(to_millis(end))],
            )
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Event>> {
        with_connection(&self.db, |conn| {
            Self::select_where(conn, "ORDER BY created_at ASC, id ASC", &[])
        })
        .await
    }

    async fn set_mirror_id(&self, id: &str, mirror_id: Option<&str>) -> Result<bool> {
        let id = id.to_string();
        let mirror_id = mirror_id.map(str::to_owned);
        with_connection(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE events SET google_calendar_id = ?2 WHERE id = ?1",
                    params![id, mirror_id],
                )
                .map_err(map_sql_error)?;
            debug!(event_id = %id, mirror_id = ?mirror_id, updated = changed > 0, "Mirror id written");
            Ok(changed > 0)
        })
        .await
    }

    async fn refresh_venue_snapshot(
        &self,
        venue: &Venue,
        after: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let venue = venue.clone();
        with_connection(&self.db, move |conn| {
            let tx = conn.transaction().map_err(map_sql_error)?;
            tx.execute(
                SNAPSHOT_UPDATE_SQL,
                params![
                    venue.id,
                    to_millis(after),
                    venue.name,
                    venue.address,
                    venue.city,
                    venue.country,
                    to_millis(venue.updated_at),
                ],
            )
            .map_err(map_sql_error)?;
            let refreshed = Self::select_where(
                &tx,
                "WHERE venue_id = ?1 AND start_date >= ?2 ORDER BY start_date ASC, id ASC",
                &[Value::Text(venue.id.clone()), Value::Integer(to_millis(after))],
            )?;
            for event in refreshed.iter().filter(|e| e.has_live_mirror()) {
                insert_intent(&tx, &intent_for(event, SyncAction::Upsert))?;
            }
            tx.commit().map_err(map_sql_error)?;
            Ok(refreshed)
        })
        .await
    }
}

fn event_filter(query: &EventQuery) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(status) = query.status {
        values.push(Value::Text(status.as_str().to_string()));
        clauses.push(format!("status = ?{}", values.len()));
    }
    if let Some(from) = query.starts_from {
        values.push(Value::Integer(to_millis(from)));
        clauses.push(format!("start_date >= ?{}", values.len()));
    }
    if let Some(organizer) = &query.organizer_id {
        values.push(Value::Text(organizer.clone()));
        clauses.push(format!("organizer_id = ?{}", values.len()));
    }
    if let Some(category) = &query.category {
        values.push(Value::Text(category.clone()));
        clauses.push(format!("category = ?{}", values.len()));
    }
    if let Some(city) = &query.city {
        values.push(Value::Text(like_pattern(city)));
        clauses.push(format!("venue_city LIKE ?{} ESCAPE '\\'", values.len()));
    }
    if let Some(term) = &query.search {
        values.push(Value::Text(like_pattern(term)));
        let n = values.len();
        clauses.push(format!("(title LIKE ?{n} ESCAPE '\\' OR description LIKE ?{n} ESCAPE '\\')"));
    }

    let where_clause =
        if clauses.is_empty() { String::new() } else { format!("WHERE {}", clauses.join(" AND ")) };
    (where_clause, values)
}

const EVENT_COLUMNS: &str = "id, title, description, start_date, end_date, venue_id, venue_name,
        venue_address, venue_city, venue_country, capacity, available_spots, price, currency,
        status, category, image_url, registration_deadline, requires_approval, organizer_id,
        organizer_name, organizer_email, google_calendar_id, created_at, updated_at";

const EVENT_INSERT_SQL: &str = "INSERT INTO events (
        id, title, description, start_date, end_date, venue_id, venue_name, venue_address,
        venue_city, venue_country, capacity, available_spots, price, currency, status, category,
        image_url, registration_deadline, requires_approval, organizer_id, organizer_name,
        organizer_email, google_calendar_id, created_at, updated_at
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
        ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25
    )";

// The mirror column belongs to the sync worker and is not written here.
const EVENT_UPDATE_SQL: &str = "UPDATE events SET
        title = ?2, description = ?3, start_date = ?4, end_date = ?5, venue_id = ?6,
        venue_name = ?7, venue_address = ?8, venue_city = ?9, venue_country = ?10,
        capacity = ?11, available_spots = ?12, price = ?13, currency = ?14, status = ?15,
        category = ?16, image_url = ?17, registration_deadline = ?18, requires_approval = ?19,
        updated_at = ?20
    WHERE id = ?1";

const SNAPSHOT_UPDATE_SQL: &str = "UPDATE events SET
        venue_name = ?3, venue_address = ?4, venue_city = ?5, venue_country = ?6, updated_at = ?7
    WHERE venue_id = ?1 AND start_date >= ?2";

fn map_event_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start_date: millis_column(row, 3)?,
        end_date: opt_millis_column(row, 4)?,
        venue_id: row.get(5)?,
        venue_name: row.get(6)?,
        venue_address: row.get(7)?,
        venue_city: row.get(8)?,
        venue_country: row.get(9)?,
        capacity: row.get(10)?,
        available_spots: row.get(11)?,
        price: row.get(12)?,
        currency: row.get(13)?,
        status: parse_column::<EventStatus>(row, 14)?,
        category: row.get(15)?,
        image_url: row.get(16)?,
        registration_deadline: opt_millis_column(row, 17)?,
        requires_approval: row.get(18)?,
        organizer_id: row.get(19)?,
        organizer_name: row.get(20)?,
        organizer_email: row.get(21)?,
        google_calendar_id: row.get(22)?,
        created_at: millis_column(row, 23)?,
        updated_at: millis_column(row, 24)?,
    })
}
