use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::context::AppContext;
use crate::routes::{AppError, Envelope};

pub fn router() -> Router<Arc<AppContext>> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
struct Health {
    database: &'static str,
    version: &'static str,
}

/// GET /health - Database round trip
async fn health(State(ctx): State<Arc<AppContext>>) -> Result<Json<Envelope<Health>>, AppError> {
    ctx.db.health_check()?;
    Ok(Envelope::data(Health { database: "ok", version: env!("CARGO_PKG_VERSION") }))
}
