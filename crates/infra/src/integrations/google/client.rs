//! Calendar v3 REST adapter.

use std::sync::Arc;

use async_trait::async_trait;
use eventhub_core::{CalendarGateway, CalendarResult, CredentialProvider};
use eventhub_domain::{CalendarConfig, CalendarEventPayload, CalendarFailure, RemoteCalendarEvent};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, info, warn};

use super::api_failure;
use crate::http::HttpClient;

/// Google Calendar client for a single target calendar.
pub struct GoogleCalendarClient {
    http: HttpClient,
    base_url: String,
    calendar_id: Option<String>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl GoogleCalendarClient {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        calendar_id: Option<String>,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            calendar_id: calendar_id.filter(|id| !id.trim().is_empty()),
            credentials,
        }
    }

    /// Client for the configured calendar. Unconfigured when the calendar id
    /// or credentials are missing.
    pub fn from_config(
        config: &CalendarConfig,
        http: HttpClient,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> Self {
        Self::new(http, config.api_base_url.clone(), config.calendar_id().map(str::to_owned), credentials)
    }

    fn events_url(&self) -> CalendarResult<String> {
        let calendar_id = self.calendar_id.as_deref().ok_or(CalendarFailure::NotConfigured)?;
        Ok(format!("{}/calendars/{}/events", self.base_url, urlencoding::encode(calendar_id)))
    }

    fn event_url(&self, external_id: &str) -> CalendarResult<String> {
        if external_id.trim().is_empty() {
            return Err(CalendarFailure::NoGoogleCalendarId);
        }
        Ok(format!("{}/{}", self.events_url()?, urlencoding::encode(external_id)))
    }

    async fn authorized(&self, method: Method, url: &str) -> CalendarResult<RequestBuilder> {
        let credentials = self.credentials.as_ref().ok_or(CalendarFailure::NotConfigured)?;
        let token = credentials.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder, retry: bool) -> CalendarResult<Response> {
        let result =
            if retry { self.http.send(request).await } else { self.http.send_once(request).await };
        let response = result.map_err(|err| CalendarFailure::exception(err.to_string()))?;

        // A rejected token must not be reused by the next attempt.
        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(credentials) = &self.credentials {
                warn!("Calendar rejected the access token");
                credentials.invalidate().await;
            }
        }
        Ok(response)
    }
}

fn is_gone(status: StatusCode) -> bool {
    matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE)
}

async fn remote_event(response: Response) -> CalendarResult<RemoteCalendarEvent> {
    response.json::<RemoteCalendarEvent>().await.map_err(|err| {
        CalendarFailure::exception(format!("failed to parse calendar response: {err}"))
    })
}

#[async_trait]
impl CalendarGateway for GoogleCalendarClient {
    fn is_configured(&self) -> bool {
        self.calendar_id.is_some() && self.credentials.is_some()
    }

    async fn add(&self, payload: &CalendarEventPayload) -> CalendarResult<String> {
        let url = self.events_url()?;
        let request = self.authorized(Method::POST, &url).await?.json(payload);

        // Inserts are not idempotent; the outbox retries instead.
        let response = self.send(request, false).await?;
        if !response.status().is_success() {
            return Err(api_failure(response).await);
        }

        let created = remote_event(response).await?;
        info!(external_id = %created.id, "Calendar event created");
        Ok(created.id)
    }

    async fn update(
        &self,
        external_id: &str,
        payload: &CalendarEventPayload,
    ) -> CalendarResult<RemoteCalendarEvent> {
        let url = self.event_url(external_id)?;
        let request = self.authorized(Method::PUT, &url).await?.json(payload);

        let response = self.send(request, true).await?;
        if !response.status().is_success() {
            return Err(api_failure(response).await);
        }

        debug!(external_id, "Calendar event updated");
        remote_event(response).await
    }

    async fn delete(&self, external_id: &str) -> CalendarResult<()> {
        let url = self.event_url(external_id)?;
        let request = self.authorized(Method::DELETE, &url).await?;

        let response = self.send(request, true).await?;
        let status = response.status();
        if status.is_success() || is_gone(status) {
            info!(external_id, already_gone = is_gone(status), "Calendar event deleted");
            return Ok(());
        }
        Err(api_failure(response).await)
    }

    async fn find(&self, external_id: &str) -> CalendarResult<Option<RemoteCalendarEvent>> {
        let url = self.event_url(external_id)?;
        let request = self.authorized(Method::GET, &url).await?;

        let response = self.send(request, true).await?;
        let status = response.status();
        if is_gone(status) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(api_failure(response).await);
        }

        // Deleted events stay readable as cancelled tombstones.
        let event = remote_event(response).await?;
        if event.status.as_deref() == Some("cancelled") {
            return Ok(None);
        }
        Ok(Some(event))
    }
}
