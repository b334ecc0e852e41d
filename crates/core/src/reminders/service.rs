//! Reminder service - one notification per event starting in ~24 hours

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use eventhub_domain::constants::{REMINDER_LOOKAHEAD_HOURS, REMINDER_WINDOW_HALF_MINUTES};
use eventhub_domain::{Event, Result};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::message;
use super::ports::ReminderNotifier;
use crate::events::ports::EventRepository;

/// An event selected by a reminder run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderCandidate {
    pub event_id: String,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub hours_until: f64,
    pub has_email: bool,
}

/// Outcome of one reminder run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderReport {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub candidates: Vec<ReminderCandidate>,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Inclusive window `[now + 24h - 30m, now + 24h + 30m]`.
pub fn reminder_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let center = now + Duration::hours(REMINDER_LOOKAHEAD_HOURS);
    let half = Duration::minutes(REMINDER_WINDOW_HALF_MINUTES);
    (center - half, center + half)
}

/// Finds events starting soon and notifies their organizers.
pub struct ReminderService {
    events: Arc<dyn EventRepository>,
    notifier: Arc<dyn ReminderNotifier>,
    app_url: String,
    time_zone: Tz,
    run_lock: Mutex<()>,
}

impl ReminderService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        notifier: Arc<dyn ReminderNotifier>,
        app_url: impl Into<String>,
    ) -> Self {
        Self { events, notifier, app_url: app_url.into(), time_zone: Tz::UTC, run_lock: Mutex::new(()) }
    }

    /// Zone used to format dates in messages.
    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Run once for `now`.
    ///
    /// Returns `Ok(None)` without doing anything when another run is still
    /// in flight. Send failures are counted, never returned.
    ///
    /// # Errors
    /// Only when the candidate query fails.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<Option<ReminderReport>> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("Reminder run skipped, previous run still in progress");
            return Ok(None);
        };

        let (window_start, window_end) = reminder_window(now);
        let events = self.events.find_published_between(window_start, window_end).await?;

        let mut report = ReminderReport {
            window_start,
            window_end,
            candidates: events.iter().map(|e| candidate(e, now)).collect(),
            sent: 0,
            skipped: 0,
            failed: 0,
        };

        for event in &events {
            let Some(reminder) = message::render(event, &self.app_url, self.time_zone) else {
                report.skipped += 1;
                continue;
            };

            match self.notifier.send(&reminder).await {
                Ok(()) => report.sent += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!(event_id = %event.id, error = %err, "Failed to send event reminder");
                }
            }
        }

        info!(
            window_start = %window_start,
            window_end = %window_end,
            candidates = report.candidates.len(),
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failed,
            "Event reminder run finished"
        );
        Ok(Some(report))
    }
}

#[allow(clippy::cast_precision_loss)]
fn candidate(event: &Event, now: DateTime<Utc>) -> ReminderCandidate {
    ReminderCandidate {
        event_id: event.id.clone(),
        title: event.title.clone(),
        start_date: event.start_date,
        hours_until: (event.start_date - now).num_seconds() as f64 / 3600.0,
        has_email: event.organizer_email.as_deref().is_some_and(|e| !e.trim().is_empty()),
    }
}
