//! Calendar sync processor
//!
//! Executes outbox intents against the external calendar and records the
//! outcome on the intent. The event row is read at processing time so the
//! calendar always receives the latest local state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eventhub_domain::constants::{DEFAULT_SYNC_MAX_ATTEMPTS, MAX_ERROR_REASON_LEN};
use eventhub_domain::{CalendarEventPayload, Event, Result, SyncAction, SyncIntent};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::errors::SyncError;
use super::ports::{CalendarGateway, SyncOutbox};
use crate::events::ports::EventRepository;

/// What happened to a single intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Sent,
    Dismissed(String),
    Retry { error: String, next_attempt_at: DateTime<Utc> },
    Failed(String),
}

/// Totals for one processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub sent: usize,
    pub dismissed: usize,
    pub retried: usize,
    pub failed: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: &IntentOutcome) {
        self.processed += 1;
        match outcome {
            IntentOutcome::Sent => self.sent += 1,
            IntentOutcome::Dismissed(_) => self.dismissed += 1,
            IntentOutcome::Retry { .. } => self.retried += 1,
            IntentOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Successful execution of an intent.
enum Step {
    Done,
    Dismiss(&'static str),
}

type StepResult = std::result::Result<Step, SyncError>;

/// Applies outbox intents to the external calendar.
pub struct CalendarSyncProcessor {
    events: Arc<dyn EventRepository>,
    outbox: Arc<dyn SyncOutbox>,
    calendar: Arc<dyn CalendarGateway>,
    max_attempts: u32,
}

impl CalendarSyncProcessor {
    pub fn new(
        events: Arc<dyn EventRepository>,
        outbox: Arc<dyn SyncOutbox>,
        calendar: Arc<dyn CalendarGateway>,
    ) -> Self {
        Self { events, outbox, calendar, max_attempts: DEFAULT_SYNC_MAX_ATTEMPTS }
    }

    /// Attempts before an intent is marked failed.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Process up to `limit` intents that are due at `now`.
    ///
    /// # Errors
    /// Repository failures while reading the queue or recording outcomes.
    pub async fn process_due(&self, limit: usize, now: DateTime<Utc>) -> Result<BatchReport> {
        let intents = self.outbox.dequeue_batch(limit, now).await?;
        let mut report = BatchReport::default();

        for intent in &intents {
            let outcome = self.process(intent, now).await?;
            report.record(&outcome);
        }

        if report.processed > 0 {
            info!(
                processed = report.processed,
                sent = report.sent,
                dismissed = report.dismissed,
                retried = report.retried,
                failed = report.failed,
                "Calendar sync batch processed"
            );
        }
        Ok(report)
    }

    /// Delete up to `limit` closed intents processed before `before`.
    ///
    /// # Errors
    /// Repository failures.
    pub async fn prune_closed(&self, before: DateTime<Utc>, limit: usize) -> Result<usize> {
        self.outbox.prune_closed(before, limit).await
    }

    /// Execute one intent and record its outcome.
    ///
    /// # Errors
    /// Only when the outcome cannot be written back to the outbox.
    pub async fn process(&self, intent: &SyncIntent, now: DateTime<Utc>) -> Result<IntentOutcome> {
        let outcome = match self.execute(intent).await {
            Ok(Step::Done) => {
                self.outbox.mark_sent(&intent.id).await?;
                IntentOutcome::Sent
            }
            Ok(Step::Dismiss(reason)) => {
                self.release_mirror(intent).await?;
                self.outbox.mark_dismissed(&intent.id, reason).await?;
                IntentOutcome::Dismissed(reason.to_string())
            }
            Err(err) => {
                let attempt = intent.attempts + 1;
                let message = truncate_reason(&err.to_string());
                if err.should_retry() && attempt < self.max_attempts {
                    let delay = chrono::Duration::from_std(err.backoff(attempt))
                        .unwrap_or_else(|_| chrono::Duration::seconds(60));
                    let next_attempt_at = now + delay;
                    self.outbox.mark_retry(&intent.id, &message, next_attempt_at).await?;
                    IntentOutcome::Retry { error: message, next_attempt_at }
                } else {
                    self.release_mirror(intent).await?;
                    self.outbox.mark_failed(&intent.id, &message).await?;
                    IntentOutcome::Failed(message)
                }
            }
        };

        match &outcome {
            IntentOutcome::Sent | IntentOutcome::Dismissed(_) => debug!(
                intent_id = %intent.id,
                event_id = %intent.event_id,
                action = %intent.action,
                outcome = ?outcome,
                "Sync intent closed"
            ),
            IntentOutcome::Retry { .. } | IntentOutcome::Failed(_) => warn!(
                intent_id = %intent.id,
                event_id = %intent.event_id,
                action = %intent.action,
                attempts = intent.attempts + 1,
                outcome = ?outcome,
                "Sync intent failed"
            ),
        }
        Ok(outcome)
    }

    /// Unlink a retracted event from its remote copy when the intent closes
    /// without reaching the calendar.
    async fn release_mirror(&self, intent: &SyncIntent) -> Result<()> {
        if intent.action != SyncAction::Retract {
            return Ok(());
        }
        let Some(event) = self.events.find_by_id(&intent.event_id).await? else {
            return Ok(());
        };
        if event.status.is_published() || event.google_calendar_id.is_none() {
            return Ok(());
        }
        self.events.set_mirror_id(&event.id, None).await?;
        debug!(event_id = %event.id, "Mirror id cleared without remote retract");
        Ok(())
    }

    async fn execute(&self, intent: &SyncIntent) -> StepResult {
        if !self.calendar.is_configured() {
            return Ok(Step::Dismiss("not_configured"));
        }

        if intent.action == SyncAction::RetractDeleted {
            return self.retract_deleted(intent).await;
        }

        let Some(event) = self.events.find_by_id(&intent.event_id).await? else {
            return Ok(Step::Dismiss("event not found"));
        };

        match intent.action {
            SyncAction::Publish | SyncAction::Upsert => {
                if !event.status.is_published() {
                    return Ok(Step::Dismiss("event not published"));
                }
                self.upsert(&event).await
            }
            SyncAction::Retract => {
                if event.status.is_published() {
                    return Ok(Step::Dismiss("event published again"));
                }
                self.retract(&event, intent.mirror_id.as_deref()).await
            }
            SyncAction::RetractDeleted => self.retract_deleted(intent).await,
        }
    }

    /// Update the remote copy, or create it when there is none.
    async fn upsert(&self, event: &Event) -> StepResult {
        let payload = CalendarEventPayload::from(event);

        if let Some(mirror) = event.mirror_id() {
            if let Some(remote) = self.calendar.find(mirror).await? {
                // Writing an unchanged copy would trigger another push notification.
                if remote.matches(&payload) {
                    debug!(event_id = %event.id, mirror_id = mirror, "Remote copy already current");
                    return Ok(Step::Done);
                }
                match self.calendar.update(mirror, &payload).await {
                    Ok(_) => return Ok(Step::Done),
                    Err(failure) if failure.is_not_found() => {}
                    Err(failure) => return Err(failure.into()),
                }
            }
            debug!(event_id = %event.id, mirror_id = mirror, "Remote copy missing, re-creating");
        }

        self.publish(event, &payload).await
    }

    async fn publish(&self, event: &Event, payload: &CalendarEventPayload) -> StepResult {
        let remote_id = self.calendar.add(payload).await?;

        if self.events.set_mirror_id(&event.id, Some(&remote_id)).await? {
            info!(event_id = %event.id, mirror_id = %remote_id, "Event published to calendar");
            return Ok(Step::Done);
        }

        // The event was deleted while the remote copy was being created.
        if let Err(failure) = self.calendar.delete(&remote_id).await {
            warn!(
                event_id = %event.id,
                mirror_id = %remote_id,
                reason = failure.reason(),
                "Failed to remove calendar copy of deleted event"
            );
        }
        Ok(Step::Dismiss("event deleted during publish"))
    }

    async fn retract(&self, event: &Event, captured: Option<&str>) -> StepResult {
        let Some(mirror) = event.mirror_id().or(captured).filter(|m| !m.is_empty()) else {
            return Ok(Step::Dismiss("no mirror id"));
        };

        if self.calendar.find(mirror).await?.is_some() {
            self.calendar.delete(mirror).await?;
        }
        self.events.set_mirror_id(&event.id, None).await?;
        info!(event_id = %event.id, mirror_id = mirror, "Event retracted from calendar");
        Ok(Step::Done)
    }

    async fn retract_deleted(&self, intent: &SyncIntent) -> StepResult {
        let Some(mirror) = intent.mirror_id.as_deref().filter(|m| !m.is_empty()) else {
            return Ok(Step::Dismiss("no mirror id"));
        };

        if self.calendar.find(mirror).await?.is_some() {
            self.calendar.delete(mirror).await?;
        }
        info!(event_id = %intent.event_id, mirror_id = mirror, "Deleted event retracted from calendar");
        Ok(Step::Done)
    }
}

/// Truncate an error message to fit the outbox error column.
pub fn truncate_reason(reason: &str) -> String {
    if reason.len() <= MAX_ERROR_REASON_LEN {
        return reason.to_string();
    }
    let mut end = MAX_ERROR_REASON_LEN;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    reason[..end].to_string()
}
