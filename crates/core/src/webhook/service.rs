//! Calendar push notification handling
//!
//! The external calendar reports changes with a resource state header.
//! Local records stay the source of truth: a remote deletion unpublishes the
//! local event, a remote edit is overwritten by queueing the local state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use eventhub_domain::{ErrorCode, Event, EventHubError, EventStatus, Result, SyncAction};
use moka::sync::Cache;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::events::lifecycle::intent_for;
use crate::events::ports::EventRepository;
use crate::sync::ports::SyncOutbox;

static EVENT_ID_IN_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/events/([^/?]+)").expect("EVENT_ID_IN_URI should compile - this is a bug")
});

const SEEN_MESSAGES_TTL: Duration = Duration::from_secs(600);
const SEEN_MESSAGES_CAPACITY: u64 = 10_000;

/// Value of the resource state header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    Sync,
    Exists,
    NotExists,
    Other(String),
}

impl ResourceState {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).unwrap_or_default() {
            "sync" => Self::Sync,
            "exists" => Self::Exists,
            "not_exists" => Self::NotExists,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Headers and credentials of one push notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookNotification {
    pub resource_state: Option<String>,
    pub resource_id: Option<String>,
    pub resource_uri: Option<String>,
    pub message_number: Option<String>,
    /// Secret from the `secret` query parameter or the secret header.
    pub secret: Option<String>,
}

/// Acknowledgement returned to the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAck {
    SyncReceived,
    DeletionProcessed,
    UpdateReceived,
    Acknowledged,
}

impl WebhookAck {
    pub const fn message(self) -> &'static str {
        match self {
            Self::SyncReceived => "sync_received",
            Self::DeletionProcessed => "deletion_processed",
            Self::UpdateReceived => "update_received",
            Self::Acknowledged => "acknowledged",
        }
    }
}

/// Maps calendar notifications onto local state.
pub struct WebhookService {
    events: Arc<dyn EventRepository>,
    outbox: Arc<dyn SyncOutbox>,
    secret: Option<String>,
    seen: Cache<String, ()>,
}

impl WebhookService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        outbox: Arc<dyn SyncOutbox>,
        secret: Option<String>,
    ) -> Self {
        Self {
            events,
            outbox,
            secret: secret.filter(|s| !s.is_empty()),
            seen: Cache::builder()
                .max_capacity(SEEN_MESSAGES_CAPACITY)
                .time_to_live(SEEN_MESSAGES_TTL)
                .build(),
        }
    }

    /// Plain equality check against the configured secret, if any.
    pub fn verify_secret(&self, provided: Option<&str>) -> Result<()> {
        match &self.secret {
            Some(expected) if provided != Some(expected.as_str()) => {
                warn!("Invalid webhook secret");
                Err(EventHubError::Unauthorized { code: ErrorCode::InvalidWebhookSecret })
            }
            _ => Ok(()),
        }
    }

    /// Verify and apply a notification.
    ///
    /// # Errors
    /// `Unauthorized` for a bad secret; storage failures otherwise.
    pub async fn handle(&self, notification: &WebhookNotification) -> Result<WebhookAck> {
        self.verify_secret(notification.secret.as_deref())?;

        let state = ResourceState::parse(notification.resource_state.as_deref());
        info!(
            resource_state = ?state,
            resource_id = notification.resource_id.as_deref().unwrap_or_default(),
            resource_uri = notification.resource_uri.as_deref().unwrap_or_default(),
            "Calendar webhook received"
        );

        let message_key = dedup_key(notification);
        if message_key.as_ref().is_some_and(|key| self.seen.contains_key(key)) {
            debug!(message_number = ?notification.message_number, "Duplicate calendar webhook ignored");
            return Ok(ack_for(&state));
        }

        match state {
            ResourceState::Sync => {}
            ResourceState::NotExists => {
                if let Some(event) = self.mirrored_event(notification).await? {
                    self.unpublish_deleted(event).await?;
                }
            }
            ResourceState::Exists => {
                if let Some(event) = self.mirrored_event(notification).await? {
                    self.reassert_local(&event).await?;
                }
            }
            ResourceState::Other(_) => {}
        }

        // Only applied messages are remembered; a failed one is redelivered.
        if let Some(key) = message_key {
            self.seen.insert(key, ());
        }
        Ok(ack_for(&state))
    }

    async fn mirrored_event(&self, notification: &WebhookNotification) -> Result<Option<Event>> {
        let Some(mirror_id) = notification.resource_uri.as_deref().and_then(event_id_from_uri) else {
            return Ok(None);
        };
        let event = self.events.find_by_mirror_id(&mirror_id).await?;
        if event.is_none() {
            info!(mirror_id = %mirror_id, "Webhook names an event with no local mirror");
        }
        Ok(event)
    }

    /// The remote copy is gone: drop the link and stop advertising the event.
    async fn unpublish_deleted(&self, mut event: Event) -> Result<()> {
        self.events.set_mirror_id(&event.id, None).await?;

        if event.status.is_published() {
            event.status = EventStatus::Cancelled;
            event.google_calendar_id = None;
            event.updated_at = Utc::now();
            self.events.update(&event, None).await?;
        }
        info!(event_id = %event.id, status = %event.status, "Event deleted in calendar, mirror cleared");
        Ok(())
    }

    /// The remote copy changed: queue the local state to overwrite it.
    async fn reassert_local(&self, event: &Event) -> Result<()> {
        let action =
            if event.status.is_published() { SyncAction::Upsert } else { SyncAction::Retract };
        if self.outbox.has_pending(&event.id, action).await? {
            debug!(event_id = %event.id, action = %action, "Reconciliation already queued");
            return Ok(());
        }
        let intent = intent_for(event, action);
        self.outbox.enqueue(&intent).await?;
        info!(event_id = %event.id, action = %action, "Remote calendar change queued for reconciliation");
        Ok(())
    }
}

fn dedup_key(notification: &WebhookNotification) -> Option<String> {
    let resource = notification.resource_id.as_deref()?;
    let number = notification.message_number.as_deref()?;
    Some(format!("{resource}:{number}"))
}

fn ack_for(state: &ResourceState) -> WebhookAck {
    match state {
        ResourceState::Sync => WebhookAck::SyncReceived,
        ResourceState::NotExists => WebhookAck::DeletionProcessed,
        ResourceState::Exists => WebhookAck::UpdateReceived,
        ResourceState::Other(_) => WebhookAck::Acknowledged,
    }
}

/// Percent-decoded event id from a resource URI such as
/// `https://www.googleapis.com/calendar/v3/calendars/c/events/abc123?alt=json`.
pub fn event_id_from_uri(uri: &str) -> Option<String> {
    let raw = EVENT_ID_IN_URI.captures(uri)?.get(1)?.as_str();
    urlencoding::decode(raw).ok().map(|id| id.into_owned())
}
