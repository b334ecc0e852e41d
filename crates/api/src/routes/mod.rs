//! HTTP routes
//!
//! Every response uses the `{ok, data?, total?}` envelope; failures are
//! `{ok: false, code, message?}` with the status derived from the error kind.

pub mod admin;
pub mod events;
pub mod health;
pub mod venues;
pub mod webhook;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use eventhub_domain::{ErrorCode, EventHubError, Page};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::context::AppContext;

/// Build the full application router.
pub fn router(ctx: Arc<AppContext>) -> Router {
    let cors_permissive = ctx.config.server.cors_permissive;

    let app = Router::new()
        .merge(health::router())
        .merge(events::router())
        .merge(venues::router())
        .merge(webhook::router())
        .merge(admin::router())
        .fallback(fallback)
        .with_state(ctx)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    } else {
        app
    }
}

async fn fallback() -> AppError {
    EventHubError::not_found(ErrorCode::NotFound, "route not found").into()
}

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Json<Self> {
        Json(Self { ok: true, data: Some(data), total: None, message: None })
    }
}

impl<T> Envelope<Vec<T>> {
    pub fn page(page: Page<T>) -> Json<Self> {
        Json(Self { ok: true, data: Some(page.items), total: Some(page.total), message: None })
    }
}

impl Envelope<()> {
    pub fn empty() -> Json<Self> {
        Json(Self { ok: true, data: None, total: None, message: None })
    }

    pub fn message(message: &'static str) -> Json<Self> {
        Json(Self { ok: true, data: None, total: None, message: Some(message) })
    }
}

/// Failure envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct AppError {
    error: EventHubError,
    code: ErrorCode,
}

impl AppError {
    /// Report `code` instead of the error's own code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    fn status(&self) -> StatusCode {
        match &self.error {
            EventHubError::Validation { .. } | EventHubError::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            EventHubError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            EventHubError::Forbidden(_) => StatusCode::FORBIDDEN,
            EventHubError::NotFound { .. } => StatusCode::NOT_FOUND,
            EventHubError::Database(_)
            | EventHubError::Config(_)
            | EventHubError::Network(_)
            | EventHubError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> Option<String> {
        match &self.error {
            EventHubError::Validation { message, .. } | EventHubError::NotFound { message, .. } => {
                Some(message.clone())
            }
            EventHubError::Forbidden(reason) => Some(reason.clone()),
            EventHubError::InvalidTransition { .. } => Some(self.error.to_string()),
            _ => None,
        }
    }
}

impl From<EventHubError> for AppError {
    fn from(error: EventHubError) -> Self {
        let code = error.code();
        Self { error, code }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.error, code = %self.code, "Request failed");
        }
        let body = ErrorResponse { ok: false, code: self.code, message: self.message() };
        (status, Json(body)).into_response()
    }
}

/// JSON body whose rejections become `INVALID_BODY`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(invalid_body(rejection.body_text())),
        }
    }
}

/// Optional JSON body: an empty request body yields `T::default()`.
#[derive(Debug)]
pub struct OptionalJson<T>(pub T);

impl<S, T> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| invalid_body(rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|err| invalid_body(err.to_string()))
    }
}

fn invalid_body(message: String) -> AppError {
    EventHubError::validation(ErrorCode::InvalidBody, message).into()
}
