//! SQLite-backed venue repository.

use std::sync::Arc;

use async_trait::async_trait;
use eventhub_core::VenueRepository;
use eventhub_domain::constants::VENUE_SORT_FIELDS;
use eventhub_domain::{Page, Result, Venue, VenueQuery};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use super::manager::{map_sql_error, DbManager};
use super::sql::{
    like_pattern, millis_column, order_clause, to_i64, to_millis, to_u64, with_connection,
};
use crate::errors::InfraError;

/// Venue storage on the shared pool.
pub struct SqliteVenueRepository {
    db: Arc<DbManager>,
}

impl SqliteVenueRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VenueRepository for SqliteVenueRepository {
    async fn insert(&self, venue: &Venue) -> Result<()> {
        let venue = venue.clone();
        with_connection(&self.db, move |conn| {
            let amenities = serde_json::to_string(&venue.amenities).map_err(InfraError::from)?;
            conn.execute(
                VENUE_INSERT_SQL,
                params![
                    venue.id,
                    venue.name,
                    venue.address,
                    venue.city,
                    venue.country,
                    venue.capacity,
                    amenities,
                    venue.owner_id,
                    to_millis(venue.created_at),
                    to_millis(venue.updated_at),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }

    async fn update(&self, venue: &Venue) -> Result<bool> {
        let venue = venue.clone();
        with_connection(&self.db, move |conn| {
            let amenities = serde_json::to_string(&venue.amenities).map_err(InfraError::from)?;
            let changed = conn
                .execute(
                    VENUE_UPDATE_SQL,
                    params![
                        venue.id,
                        venue.name,
                        venue.address,
                        venue.city,
                        venue.country,
                        venue.capacity,
                        amenities,
                        to_millis(venue.updated_at),
                    ],
                )
                .map_err(map_sql_error)?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        with_connection(&self.db, move |conn| {
            let changed =
                conn.execute("DELETE FROM venues WHERE id = ?1", params![id]).map_err(map_sql_error)?;
            Ok(changed > 0)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Venue>> {
        let id = id.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                &format!("SELECT {VENUE_COLUMNS} FROM venues WHERE id = ?1"),
                params![id],
                map_venue_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    async fn search(&self, query: &VenueQuery) -> Result<Page<Venue>> {
        let query = query.clone();
        with_connection(&self.db, move |conn| {
            let (where_clause, mut values) = venue_filter(&query);

            let total: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM venues {where_clause}"),
                    params_from_iter(values.iter()),
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;

            let order = order_clause(&query.sort, VENUE_SORT_FIELDS, "created_at");
            values.push(Value::Integer(i64::from(query.limit)));
            values.push(Value::Integer(to_i64(query.offset)));
            let limit_idx = values.len() - 1;

            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {VENUE_COLUMNS} FROM venues {where_clause} {order} LIMIT ?{limit_idx} OFFSET ?{}",
                    limit_idx + 1
                ))
                .map_err(map_sql_error)?;
            let items = stmt
                .query_map(params_from_iter(values.iter()), map_venue_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            Ok(Page { items, total: to_u64(total) })
        })
        .await
    }
}

fn venue_filter(query: &VenueQuery) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(owner) = &query.owner_id {
        values.push(Value::Text(owner.clone()));
        clauses.push(format!("owner_id = ?{}", values.len()));
    }
    if let Some(city) = &query.city {
        values.push(Value::Text(city.clone()));
        clauses.push(format!("city = ?{} COLLATE NOCASE", values.len()));
    }
    if let Some(term) = &query.search {
        values.push(Value::Text(like_pattern(term)));
        let n = values.len();
        clauses.push(format!(
            "(name LIKE ?{n} ESCAPE '\\' OR address LIKE ?{n} ESCAPE '\\' OR city LIKE ?{n} ESCAPE '\\')"
        ));
    }

    let where_clause =
        if clauses.is_empty() { String::new() } else { format!("WHERE {}", clauses.join(" AND ")) };
    (where_clause, values)
}

const VENUE_COLUMNS: &str =
    "id, name, address, city, country, capacity, amenities, owner_id, created_at, updated_at";

const VENUE_INSERT_SQL: &str = "INSERT INTO venues (
        id, name, address, city, country, capacity, amenities, owner_id, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

const VENUE_UPDATE_SQL: &str = "UPDATE venues SET
        name = ?2, address = ?3, city = ?4, country = ?5, capacity = ?6, amenities = ?7,
        updated_at = ?8
    WHERE id = ?1";

fn map_venue_row(row: &Row<'_>) -> rusqlite::Result<Venue> {
    let amenities_json: String = row.get(6)?;
    let amenities = serde_json::from_str(&amenities_json).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(err))
    })?;

    Ok(Venue {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        country: row.get(4)?,
        capacity: row.get(5)?,
        amenities,
        owner_id: row.get(7)?,
        created_at: millis_column(row, 8)?,
        updated_at: millis_column(row, 9)?,
    })
}
