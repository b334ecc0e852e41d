//! External calendar payloads and failure reasons

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::event::Event;
use crate::constants::CALENDAR_TIME_ZONE;

/// Event body sent to the external calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventPayload {
    pub summary: String,
    pub description: String,
    pub location: String,
    pub start: CalendarEventTime,
    pub end: CalendarEventTime,
}

/// Point in time in the calendar's wire format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventTime {
    #[serde(default, rename = "dateTime")]
    pub date_time: String,
    #[serde(default, rename = "timeZone")]
    pub time_zone: String,
}

impl CalendarEventTime {
    /// UTC timestamp with millisecond precision.
    pub fn utc(at: DateTime<Utc>) -> Self {
        Self {
            date_time: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            time_zone: CALENDAR_TIME_ZONE.to_string(),
        }
    }
}

impl From<&Event> for CalendarEventPayload {
    fn from(event: &Event) -> Self {
        let end = event.end_date.unwrap_or(event.start_date);
        Self {
            summary: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            location: event.location(),
            start: CalendarEventTime::utc(event.start_date),
            end: CalendarEventTime::utc(end),
        }
    }
}

/// Two wire times name the same instant, whatever offset each uses.
fn same_instant(remote: Option<&CalendarEventTime>, local: &CalendarEventTime) -> bool {
    let Some(remote) = remote else {
        return false;
    };
    match (
        DateTime::parse_from_rfc3339(&remote.date_time),
        DateTime::parse_from_rfc3339(&local.date_time),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => remote.date_time == local.date_time,
    }
}

/// Subset of a remote calendar event returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCalendarEvent {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: Option<CalendarEventTime>,
    #[serde(default)]
    pub end: Option<CalendarEventTime>,
    #[serde(default, rename = "htmlLink")]
    pub html_link: Option<String>,
}

impl RemoteCalendarEvent {
    /// Whether the remote copy already shows what `payload` would write.
    pub fn matches(&self, payload: &CalendarEventPayload) -> bool {
        self.summary.as_deref().unwrap_or_default() == payload.summary
            && self.description.as_deref().unwrap_or_default() == payload.description
            && self.location.as_deref().unwrap_or_default() == payload.location
            && same_instant(self.start.as_ref(), &payload.start)
            && same_instant(self.end.as_ref(), &payload.end)
    }
}

/// Why a calendar operation did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CalendarFailure {
    #[error("calendar not configured")]
    NotConfigured,

    #[error("calendar api error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("calendar request failed: {message}")]
    Exception { message: String },

    #[error("event has no calendar id")]
    NoGoogleCalendarId,
}

impl CalendarFailure {
    /// Short reason tag.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::ApiError { .. } => "api_error",
            Self::Exception { .. } => "exception",
            Self::NoGoogleCalendarId => "no_google_calendar_id",
        }
    }

    pub fn exception(message: impl Into<String>) -> Self {
        Self::Exception { message: message.into() }
    }

    /// The remote copy does not exist (anymore).
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404 | 410, .. })
    }

    /// HTTP status for api errors.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
