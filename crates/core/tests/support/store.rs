//! In-memory store implementing the venue, event and outbox ports.
//!
//! A single mutex per collection stands in for the database transaction:
//! an event write and its intent land together.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventhub_core::events::lifecycle::intent_for;
use eventhub_core::{EventRepository, SyncOutbox, VenueRepository};
use eventhub_domain::{
    Event, EventHubError, EventQuery, OutboxStats, OutboxStatus, Page, Result, SortDirection,
    SyncAction, SyncIntent, Venue, VenueQuery,
};

#[derive(Default)]
pub struct MemoryStore {
    pub venues: Mutex<Vec<Venue>>,
    pub events: Mutex<Vec<Event>>,
    pub outbox: Mutex<Vec<SyncIntent>>,
}

impl MemoryStore {
    pub fn with_venue(self, venue: Venue) -> Self {
        self.venues.lock().unwrap().push(venue);
        self
    }

    pub fn with_event(self, event: Event) -> Self {
        self.events.lock().unwrap().push(event);
        self
    }

    pub fn event(&self, id: &str) -> Option<Event> {
        self.events.lock().unwrap().iter().find(|e| e.id == id).cloned()
    }

    pub fn intents(&self) -> Vec<SyncIntent> {
        self.outbox.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<SyncAction> {
        self.intents().iter().map(|i| i.action).collect()
    }

    pub fn push_intent(&self, intent: SyncIntent) {
        self.outbox.lock().unwrap().push(intent);
    }

    fn record(&self, intent: Option<&SyncIntent>) {
        if let Some(intent) = intent {
            self.push_intent(intent.clone());
        }
    }

    fn update_intent(&self, id: &str, apply: impl FnOnce(&mut SyncIntent)) {
        if let Some(intent) = self.outbox.lock().unwrap().iter_mut().find(|i| i.id == id) {
            apply(intent);
        }
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn paginate<T: Clone>(items: Vec<T>, limit: u32, offset: u64) -> Page<T> {
    let total = items.len() as u64;
    let items = items.into_iter().skip(offset as usize).take(limit as usize).collect();
    Page { items, total }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl VenueRepository for MemoryStore {
    async fn insert(&self, venue: &Venue) -> Result<()> {
        self.venues.lock().unwrap().push(venue.clone());
        Ok(())
    }

    async fn update(&self, venue: &Venue) -> Result<bool> {
        let mut venues = self.venues.lock().unwrap();
        match venues.iter_mut().find(|v| v.id == venue.id) {
            Some(existing) => {
                *existing = venue.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut venues = self.venues.lock().unwrap();
        let before = venues.len();
        venues.retain(|v| v.id != id);
        Ok(venues.len() != before)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Venue>> {
        Ok(self.venues.lock().unwrap().iter().find(|v| v.id == id).cloned())
    }

    async fn search(&self, query: &VenueQuery) -> Result<Page<Venue>> {
        let mut matches: Vec<Venue> = self
            .venues
            .lock()
            .unwrap()
            .iter()
            .filter(|v| query.owner_id.as_ref().map_or(true, |o| &v.owner_id == o))
            .filter(|v| query.city.as_ref().map_or(true, |c| v.city.eq_ignore_ascii_case(c)))
            .filter(|v| {
                query.search.as_ref().map_or(true, |s| {
                    contains(&v.name, s) || contains(&v.address, s) || contains(&v.city, s)
                })
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            let ordering = match query.sort.field.as_str() {
                "name" => a.name.cmp(&b.name),
                _ => a.created_at.cmp(&b.created_at),
            };
            directed(ordering, query.sort.direction)
        });
        Ok(paginate(matches, query.limit, query.offset))
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn insert(&self, event: &Event, intent: Option<&SyncIntent>) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        self.record(intent);
        Ok(())
    }

    async fn update(&self, event: &Event, intent: Option<&SyncIntent>) -> Result<bool> {
        let mut events = self.events.lock().unwrap();
        let Some(existing) = events.iter_mut().find(|e| e.id == event.id) else {
            return Ok(false);
        };
        let mirror = existing.google_calendar_id.clone();
        *existing = event.clone();
        existing.google_calendar_id = mirror;
        drop(events);
        self.record(intent);
        Ok(true)
    }

    async fn delete(&self, id: &str, intent: Option<&SyncIntent>) -> Result<bool> {
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.id != id);
        let removed = events.len() != before;
        drop(events);
        if removed {
            self.record(intent);
        }
        Ok(removed)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>> {
        Ok(self.event(id))
    }

    async fn find_by_mirror_id(&self, mirror_id: &str) -> Result<Option<Event>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.google_calendar_id.as_deref() == Some(mirror_id))
            .cloned())
    }

    async fn search(&self, query: &EventQuery) -> Result<Page<Event>> {
        let mut matches: Vec<Event> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| query.status.map_or(true, |s| e.status == s))
            .filter(|e| query.starts_from.map_or(true, |from| e.start_date >= from))
            .filter(|e| query.organizer_id.as_ref().map_or(true, |o| &e.organizer_id == o))
            .filter(|e| query.category.as_ref().map_or(true, |c| e.category.as_ref() == Some(c)))
            .filter(|e| query.city.as_ref().map_or(true, |c| contains(&e.venue_city, c)))
            .filter(|e| {
                query.search.as_ref().map_or(true, |s| {
                    contains(&e.title, s)
                        || e.description.as_deref().is_some_and(|d| contains(d, s))
                })
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            let ordering = match query.sort.field.as_str() {
                "title" => a.title.cmp(&b.title),
                "created_at" => a.created_at.cmp(&b.created_at),
                _ => a.start_date.cmp(&b.start_date),
            };
            directed(ordering, query.sort.direction)
        });
        Ok(paginate(matches, query.limit, query.offset))
    }

    async fn find_published_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.status.is_published() && e.start_date >= start && e.start_date <= end)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Event>> {
        Ok(self.events.lock().unwrap().clone())
    }

    async fn set_mirror_id(&self, id: &str, mirror_id: Option<&str>) -> Result<bool> {
        let mut events = self.events.lock().unwrap();
        match events.iter_mut().find(|e| e.id == id) {
            Some(event) => {
                event.google_calendar_id = mirror_id.map(str::to_owned);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn refresh_venue_snapshot(
        &self,
        venue: &Venue,
        after: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let mut events = self.events.lock().unwrap();
        let mut refreshed = Vec::new();
        for event in events.iter_mut().filter(|e| e.venue_id == venue.id && e.start_date >= after) {
            event.apply_venue_snapshot(venue);
            refreshed.push(event.clone());
        }
        drop(events);
        for event in refreshed.iter().filter(|e| e.has_live_mirror()) {
            self.push_intent(intent_for(event, SyncAction::Upsert));
        }
        Ok(refreshed)
    }
}

#[async_trait]
impl SyncOutbox for MemoryStore {
    async fn enqueue(&self, intent: &SyncIntent) -> Result<()> {
        self.push_intent(intent.clone());
        Ok(())
    }

    async fn dequeue_batch(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<SyncIntent>> {
        Ok(self
            .outbox
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.status == OutboxStatus::Pending && i.next_attempt_at <= now)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_sent(&self, id: &str) -> Result<()> {
        self.update_intent(id, |i| {
            i.status = OutboxStatus::Sent;
            i.processed_at = Some(Utc::now());
        });
        Ok(())
    }

    async fn mark_retry(&self, id: &str, error: &str, next_attempt_at: DateTime<Utc>) -> Result<()> {
        self.update_intent(id, |i| {
            i.attempts += 1;
            i.last_error = Some(error.to_string());
            i.next_attempt_at = next_attempt_at;
        });
        Ok(())
    }

    async fn mark_failed(&self, id: &str, error: &str) -> Result<()> {
        self.update_intent(id, |i| {
            i.attempts += 1;
            i.status = OutboxStatus::Failed;
            i.last_error = Some(error.to_string());
            i.processed_at = Some(Utc::now());
        });
        Ok(())
    }

    async fn mark_dismissed(&self, id: &str, reason: &str) -> Result<()> {
        self.update_intent(id, |i| {
            i.status = OutboxStatus::Dismissed;
            i.last_error = Some(reason.to_string());
            i.processed_at = Some(Utc::now());
        });
        Ok(())
    }

    async fn has_pending(&self, event_id: &str, action: SyncAction) -> Result<bool> {
        Ok(self.outbox.lock().unwrap().iter().any(|i| {
            i.event_id == event_id && i.action == action && i.status == OutboxStatus::Pending
        }))
    }

    async fn prune_closed(&self, before: DateTime<Utc>, limit: usize) -> Result<usize> {
        let mut outbox = self.outbox.lock().unwrap();
        let mut removed = 0;
        outbox.retain(|i| {
            let expired = i.status != OutboxStatus::Pending
                && i.processed_at.is_some_and(|at| at < before);
            if expired && removed < limit {
                removed += 1;
                return false;
            }
            true
        });
        Ok(removed)
    }

    async fn stats(&self) -> Result<OutboxStats> {
        let mut stats = OutboxStats::default();
        for intent in self.outbox.lock().unwrap().iter() {
            match intent.status {
                OutboxStatus::Pending => stats.pending += 1,
                OutboxStatus::Sent => stats.sent += 1,
                OutboxStatus::Failed => stats.failed += 1,
                OutboxStatus::Dismissed => stats.dismissed += 1,
            }
        }
        Ok(stats)
    }
}

/// Outbox over a [`MemoryStore`] whose next `enqueue` calls fail.
pub struct FlakyOutbox {
    pub store: Arc<MemoryStore>,
    failures: Mutex<u32>,
}

impl FlakyOutbox {
    pub fn failing(store: Arc<MemoryStore>, times: u32) -> Self {
        Self { store, failures: Mutex::new(times) }
    }
}

#[async_trait]
impl SyncOutbox for FlakyOutbox {
    async fn enqueue(&self, intent: &SyncIntent) -> Result<()> {
        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(EventHubError::Database("disk I/O error".into()));
            }
        }
        self.store.enqueue(intent).await
    }

    async fn dequeue_batch(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<SyncIntent>> {
        self.store.dequeue_batch(limit, now).await
    }

    async fn mark_sent(&self, id: &str) -> Result<()> {
        self.store.mark_sent(id).await
    }

    async fn mark_retry(&self, id: &str, error: &str, next_attempt_at: DateTime<Utc>) -> Result<()> {
        self.store.mark_retry(id, error, next_attempt_at).await
    }

    async fn mark_failed(&self, id: &str, error: &str) -> Result<()> {
        self.store.mark_failed(id, error).await
    }

    async fn mark_dismissed(&self, id: &str, reason: &str) -> Result<()> {
        self.store.mark_dismissed(id, reason).await
    }

    async fn has_pending(&self, event_id: &str, action: SyncAction) -> Result<bool> {
        self.store.has_pending(event_id, action).await
    }

    async fn prune_closed(&self, before: DateTime<Utc>, limit: usize) -> Result<usize> {
        self.store.prune_closed(before, limit).await
    }

    async fn stats(&self) -> Result<OutboxStats> {
        self.store.stats().await
    }
}
