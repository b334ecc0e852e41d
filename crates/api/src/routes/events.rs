//! Event endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use eventhub_domain::{Event, EventDraft, EventPatch, SearchParams};

use crate::auth::AuthUser;
use crate::context::AppContext;
use crate::routes::{AppError, Envelope, JsonBody, OptionalJson};

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/event", post(create_event))
        .route("/event/search", post(search_events))
        .route("/event/my-events/search", post(search_my_events))
        .route("/event/{id}", get(get_event).put(update_event).delete(delete_event))
}

/// POST /event/search - Published upcoming events (public)
async fn search_events(
    State(ctx): State<Arc<AppContext>>,
    OptionalJson(params): OptionalJson<SearchParams>,
) -> Result<Json<Envelope<Vec<Event>>>, AppError> {
    let page = ctx.events.search_public(&params, Utc::now()).await?;
    Ok(Envelope::page(page))
}

/// GET /event/:id (public)
async fn get_event(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Event>>, AppError> {
    Ok(Envelope::data(ctx.events.get(&id).await?))
}

/// POST /event
async fn create_event(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
    JsonBody(draft): JsonBody<EventDraft>,
) -> Result<Json<Envelope<Event>>, AppError> {
    Ok(Envelope::data(ctx.events.create(&caller, draft).await?))
}

/// POST /event/my-events/search - Own events, every event for admins
async fn search_my_events(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
    OptionalJson(params): OptionalJson<SearchParams>,
) -> Result<Json<Envelope<Vec<Event>>>, AppError> {
    let page = ctx.events.search_mine(&caller, &params).await?;
    Ok(Envelope::page(page))
}

/// PUT /event/:id
async fn update_event(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<EventPatch>,
) -> Result<Json<Envelope<Event>>, AppError> {
    Ok(Envelope::data(ctx.events.update(&caller, &id, patch).await?))
}

/// DELETE /event/:id
async fn delete_event(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, AppError> {
    ctx.events.delete(&caller, &id).await?;
    Ok(Envelope::empty())
}
