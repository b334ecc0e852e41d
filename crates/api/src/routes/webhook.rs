//! Calendar push notification endpoint

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use eventhub_core::WebhookNotification;
use eventhub_domain::{ErrorCode, EventHubError};
use serde::Deserialize;

use crate::context::AppContext;
use crate::routes::{AppError, Envelope};

pub fn router() -> Router<Arc<AppContext>> {
    Router::new().route("/webhook/calendar-sync", post(calendar_sync))
}

#[derive(Debug, Default, Deserialize)]
struct WebhookQuery {
    secret: Option<String>,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
}

/// POST /webhook/calendar-sync
///
/// The body is ignored; everything the calendar reports is in headers.
async fn calendar_sync(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
) -> Result<Json<Envelope<()>>, AppError> {
    let notification = WebhookNotification {
        resource_state: header(&headers, "x-goog-resource-state"),
        resource_id: header(&headers, "x-goog-resource-id"),
        resource_uri: header(&headers, "x-goog-resource-uri"),
        message_number: header(&headers, "x-goog-message-number"),
        secret: query.secret.or_else(|| header(&headers, "x-webhook-secret")),
    };

    match ctx.webhook.handle(&notification).await {
        Ok(ack) => Ok(Envelope::message(ack.message())),
        Err(err @ EventHubError::Unauthorized { .. }) => Err(err.into()),
        Err(err) => Err(AppError::from(EventHubError::Internal(err.to_string()))
            .with_code(ErrorCode::WebhookProcessingError)),
    }
}
