//! Venue endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use eventhub_domain::{SearchParams, Venue, VenueDraft, VenuePatch};

use crate::auth::AuthUser;
use crate::context::AppContext;
use crate::routes::{AppError, Envelope, JsonBody, OptionalJson};

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/venue", post(create_venue))
        .route("/venue/search", post(search_venues))
        .route("/venue/my-venues/search", post(search_my_venues))
        .route("/venue/{id}", get(get_venue).put(update_venue).delete(delete_venue))
}

/// POST /venue/search - Requires a signed-in caller
async fn search_venues(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(_caller): AuthUser,
    OptionalJson(params): OptionalJson<SearchParams>,
) -> Result<Json<Envelope<Vec<Venue>>>, AppError> {
    Ok(Envelope::page(ctx.venues.search(&params).await?))
}

/// GET /venue/:id
async fn get_venue(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Venue>>, AppError> {
    Ok(Envelope::data(ctx.venues.get(&id).await?))
}

/// POST /venue
async fn create_venue(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
    JsonBody(draft): JsonBody<VenueDraft>,
) -> Result<Json<Envelope<Venue>>, AppError> {
    Ok(Envelope::data(ctx.venues.create(&caller, draft).await?))
}

/// POST /venue/my-venues/search
async fn search_my_venues(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
    OptionalJson(params): OptionalJson<SearchParams>,
) -> Result<Json<Envelope<Vec<Venue>>>, AppError> {
    Ok(Envelope::page(ctx.venues.search_mine(&caller, &params).await?))
}

/// PUT /venue/:id - Refreshes the venue snapshot on future events
async fn update_venue(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<VenuePatch>,
) -> Result<Json<Envelope<Venue>>, AppError> {
    Ok(Envelope::data(ctx.venues.update(&caller, &id, patch).await?))
}

/// DELETE /venue/:id
async fn delete_venue(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, AppError> {
    ctx.venues.delete(&caller, &id).await?;
    Ok(Envelope::empty())
}
