//! Google Calendar integration
//!
//! - [`GoogleOAuthCredentials`]: refresh-token exchange with a shared cache
//! - [`GoogleCalendarClient`]: the [`CalendarGateway`](eventhub_core::CalendarGateway)
//!   adapter over the Calendar v3 REST API

mod client;
mod oauth;

pub use client::GoogleCalendarClient;
pub use oauth::GoogleOAuthCredentials;

use eventhub_domain::CalendarFailure;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

/// Token errors use a plain string, API errors an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GoogleErrorDetail {
    Api { message: String },
    Token(String),
}

/// Build an `ApiError` from a non-success response body.
async fn api_failure(response: reqwest::Response) -> CalendarFailure {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<GoogleErrorBody>(&body) {
        Ok(GoogleErrorBody { error: GoogleErrorDetail::Api { message } }) => message,
        Ok(GoogleErrorBody { error: GoogleErrorDetail::Token(code) }) => code,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body,
    };
    CalendarFailure::ApiError { status, message }
}
