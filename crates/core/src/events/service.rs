//! Event service - event CRUD, search and the calendar lifecycle

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use eventhub_domain::constants::EVENT_SORT_FIELDS;
use eventhub_domain::{
    Caller, ErrorCode, Event, EventDraft, EventHubError, EventPatch, EventQuery, EventStatus,
    Page, Result, SearchParams, SortSpec, SpotsPolicy, Venue,
};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use super::capacity::{ensure_fits_venue, ensure_non_negative, recompute_available};
use super::lifecycle::{intent_for, plan};
use super::ports::EventRepository;
use crate::utils::{ensure_manager, new_id, required};
use crate::venues::ports::VenueRepository;

/// Summary of a maintenance cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub dry_run: bool,
    /// `(id, title)` of every matching event.
    pub matched: Vec<(String, String)>,
    pub deleted: usize,
}

/// Event use cases
pub struct EventService {
    events: Arc<dyn EventRepository>,
    venues: Arc<dyn VenueRepository>,
    spots_policy: SpotsPolicy,
}

impl EventService {
    pub fn new(events: Arc<dyn EventRepository>, venues: Arc<dyn VenueRepository>) -> Self {
        Self { events, venues, spots_policy: SpotsPolicy::default() }
    }

    /// Policy applied when a capacity change would undercut bookings.
    pub fn with_spots_policy(mut self, policy: SpotsPolicy) -> Self {
        self.spots_policy = policy;
        self
    }

    /// Create an event organized by `caller`.
    ///
    /// A published event gets a `Publish` intent in the same write.
    pub async fn create(&self, caller: &Caller, draft: EventDraft) -> Result<Event> {
        let (Some(title), Some(start_date), Some(venue_id)) =
            (required(draft.title.as_deref()), draft.start_date, required(draft.venue_id.as_deref()))
        else {
            return Err(EventHubError::validation(
                ErrorCode::TitleStartDateAndVenueRequired,
                "title, start_date and venue_id are required",
            ));
        };

        let venue = self.venue(&venue_id).await?;
        let status = parse_status(draft.status.as_deref())?.unwrap_or_default();
        let capacity = ensure_non_negative(draft.capacity.unwrap_or(0))?;
        ensure_fits_venue(capacity, &venue)?;
        ensure_dates(start_date, draft.end_date)?;

        let now = Utc::now();
        let mut event = Event {
            id: new_id(),
            title,
            description: draft.description,
            start_date,
            end_date: draft.end_date,
            venue_id: String::new(),
            venue_name: String::new(),
            venue_address: String::new(),
            venue_city: String::new(),
            venue_country: String::new(),
            capacity,
            available_spots: capacity,
            price: draft.price,
            currency: draft.currency,
            status,
            category: draft.category,
            image_url: draft.image_url,
            registration_deadline: draft.registration_deadline,
            requires_approval: draft.requires_approval.unwrap_or(false),
            organizer_id: caller.id.clone(),
            organizer_name: caller.name.clone(),
            organizer_email: caller.email.clone(),
            google_calendar_id: None,
            created_at: now,
            updated_at: now,
        };
        event.apply_venue_snapshot(&venue);

        let intent = plan(None, Some(status), false)?.map(|action| intent_for(&event, action));
        self.events.insert(&event, intent.as_ref()).await?;

        info!(
            event_id = %event.id,
            status = %event.status,
            sync = ?intent.as_ref().map(|i| i.action),
            "Event created"
        );
        Ok(event)
    }

    pub async fn get(&self, id: &str) -> Result<Event> {
        self.events
            .find_by_id(id)
            .await?
            .ok_or_else(|| EventHubError::not_found(ErrorCode::NotFound, format!("event {id}")))
    }

    /// Published events starting at or after `now`.
    pub async fn search_public(&self, params: &SearchParams, now: DateTime<Utc>) -> Result<Page<Event>> {
        let (limit, offset) = params.window();
        let query = EventQuery {
            search: params.search_text().map(str::to_owned),
            category: params.category_filter().map(str::to_owned),
            city: params.city_filter().map(str::to_owned),
            status: Some(EventStatus::Published),
            organizer_id: None,
            starts_from: Some(now),
            sort: params.sort_or(EVENT_SORT_FIELDS, SortSpec::asc("start_date")),
            limit,
            offset,
        };
        self.events.search(&query).await
    }

    /// Events organized by the caller; admins see all.
    pub async fn search_mine(&self, caller: &Caller, params: &SearchParams) -> Result<Page<Event>> {
        let (limit, offset) = params.window();
        let query = EventQuery {
            search: params.search_text().map(str::to_owned),
            category: params.category_filter().map(str::to_owned),
            city: params.city_filter().map(str::to_owned),
            status: parse_status(params.status.as_deref())?,
            organizer_id: (!caller.is_admin()).then(|| caller.id.clone()),
            starts_from: None,
            sort: params.sort_or(EVENT_SORT_FIELDS, SortSpec::desc("created_at")),
            limit,
            offset,
        };
        self.events.search(&query).await
    }

    /// Apply a partial update.
    ///
    /// Capacity is checked against the venue when the venue changes or the
    /// capacity changes. Available spots keep the booked count.
    pub async fn update(&self, caller: &Caller, id: &str, patch: EventPatch) -> Result<Event> {
        let mut event = self.get(id).await?;
        ensure_manager(caller, &event.organizer_id)?;

        let previous = event.status;
        let next = parse_status(patch.status.as_deref())?.unwrap_or(previous);

        let new_capacity = ensure_non_negative(patch.capacity.unwrap_or(event.capacity))?;
        let capacity_changed = new_capacity != event.capacity;

        if patch.venue_id.is_some() || capacity_changed {
            let venue_id = match patch.venue_id.as_deref() {
                Some(venue_id) => required(Some(venue_id)).ok_or_else(|| {
                    EventHubError::validation(
                        ErrorCode::TitleStartDateAndVenueRequired,
                        "venue_id must not be blank",
                    )
                })?,
                None => event.venue_id.clone(),
            };
            let venue = self.venue(&venue_id).await?;
            ensure_fits_venue(new_capacity, &venue)?;
            if patch.venue_id.is_some() {
                event.apply_venue_snapshot(&venue);
            }
        }

        if capacity_changed {
            event.available_spots = recompute_available(
                event.capacity,
                event.available_spots,
                new_capacity,
                self.spots_policy,
            )?;
            event.capacity = new_capacity;
        }

        if let Some(title) = patch.title {
            event.title = required(Some(&title)).ok_or_else(|| {
                EventHubError::validation(
                    ErrorCode::TitleStartDateAndVenueRequired,
                    "title must not be blank",
                )
            })?;
        }
        if let Some(start_date) = patch.start_date {
            event.start_date = start_date;
        }
        if patch.end_date.is_some() {
            event.end_date = patch.end_date;
        }
        ensure_dates(event.start_date, event.end_date)?;

        if patch.description.is_some() {
            event.description = patch.description;
        }
        if patch.price.is_some() {
            event.price = patch.price;
        }
        if patch.currency.is_some() {
            event.currency = patch.currency;
        }
        if patch.category.is_some() {
            event.category = patch.category;
        }
        if patch.image_url.is_some() {
            event.image_url = patch.image_url;
        }
        if patch.registration_deadline.is_some() {
            event.registration_deadline = patch.registration_deadline;
        }
        if let Some(requires_approval) = patch.requires_approval {
            event.requires_approval = requires_approval;
        }

        let intent = plan(Some(previous), Some(next), event.mirror_id().is_some())?
            .map(|action| intent_for(&event, action));
        event.status = next;
        event.updated_at = Utc::now();

        if !self.events.update(&event, intent.as_ref()).await? {
            return Err(EventHubError::not_found(ErrorCode::NotFound, format!("event {id}")));
        }

        info!(
            event_id = %event.id,
            from = %previous,
            to = %next,
            sync = ?intent.as_ref().map(|i| i.action),
            "Event updated"
        );
        Ok(event)
    }

    /// Hard delete. A mirrored event queues a retraction in the same write.
    pub async fn delete(&self, caller: &Caller, id: &str) -> Result<()> {
        let event = self.get(id).await?;
        ensure_manager(caller, &event.organizer_id)?;
        self.remove(&event).await
    }

    /// Delete every event whose title matches `pattern`.
    pub async fn purge_matching(&self, pattern: &Regex, dry_run: bool) -> Result<CleanupReport> {
        let matches: Vec<Event> = self
            .events
            .list_all()
            .await?
            .into_iter()
            .filter(|event| pattern.is_match(&event.title))
            .collect();

        let mut report = CleanupReport {
            dry_run,
            matched: matches.iter().map(|e| (e.id.clone(), e.title.clone())).collect(),
            deleted: 0,
        };

        if dry_run {
            info!(matched = report.matched.len(), pattern = %pattern, "Cleanup dry run");
            return Ok(report);
        }

        for event in &matches {
            self.remove(event).await?;
            report.deleted += 1;
        }
        info!(deleted = report.deleted, pattern = %pattern, "Cleanup finished");
        Ok(report)
    }

    async fn remove(&self, event: &Event) -> Result<()> {
        let intent = plan(Some(event.status), None, event.mirror_id().is_some())?
            .map(|action| intent_for(event, action));

        if !self.events.delete(&event.id, intent.as_ref()).await? {
            return Err(EventHubError::not_found(ErrorCode::NotFound, format!("event {}", event.id)));
        }
        debug!(event_id = %event.id, retract = intent.is_some(), "Event deleted");
        Ok(())
    }

    async fn venue(&self, id: &str) -> Result<Venue> {
        self.venues
            .find_by_id(id)
            .await?
            .ok_or_else(|| EventHubError::not_found(ErrorCode::VenueNotFound, format!("venue {id}")))
    }
}

fn parse_status(raw: Option<&str>) -> Result<Option<EventStatus>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => EventStatus::from_str(raw)
            .map(Some)
            .map_err(|msg| EventHubError::validation(ErrorCode::InvalidStatus, msg)),
    }
}

fn ensure_dates(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<()> {
    match end {
        Some(end) if end < start => Err(EventHubError::validation(
            ErrorCode::InvalidDate,
            "end_date must not be before start_date",
        )),
        _ => Ok(()),
    }
}
