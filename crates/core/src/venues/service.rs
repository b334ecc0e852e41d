//! Venue service - venue CRUD and the snapshot cascade onto events

use std::sync::Arc;

use chrono::Utc;
use eventhub_domain::constants::VENUE_SORT_FIELDS;
use eventhub_domain::{
    Caller, ErrorCode, EventHubError, Page, Result, SearchParams, SortSpec, Venue, VenueDraft,
    VenuePatch, VenueQuery,
};
use tracing::info;

use super::ports::VenueRepository;
use crate::events::capacity::ensure_non_negative;
use crate::events::ports::EventRepository;
use crate::utils::{ensure_manager, new_id, required};

/// Venue use cases
pub struct VenueService {
    venues: Arc<dyn VenueRepository>,
    events: Arc<dyn EventRepository>,
}

impl VenueService {
    pub fn new(venues: Arc<dyn VenueRepository>, events: Arc<dyn EventRepository>) -> Self {
        Self { venues, events }
    }

    /// Create a venue owned by `caller`.
    pub async fn create(&self, caller: &Caller, draft: VenueDraft) -> Result<Venue> {
        let (Some(name), Some(address), Some(city), Some(country)) = (
            required(draft.name.as_deref()),
            required(draft.address.as_deref()),
            required(draft.city.as_deref()),
            required(draft.country.as_deref()),
        ) else {
            return Err(missing_fields());
        };

        let now = Utc::now();
        let venue = Venue {
            id: new_id(),
            name,
            address,
            city,
            country,
            capacity: ensure_non_negative(draft.capacity.unwrap_or(0))?,
            amenities: clean_amenities(draft.amenities.unwrap_or_default()),
            owner_id: caller.id.clone(),
            created_at: now,
            updated_at: now,
        };

        self.venues.insert(&venue).await?;
        info!(venue_id = %venue.id, owner_id = %venue.owner_id, "Venue created");
        Ok(venue)
    }

    pub async fn get(&self, id: &str) -> Result<Venue> {
        self.venues
            .find_by_id(id)
            .await?
            .ok_or_else(|| EventHubError::not_found(ErrorCode::NotFound, format!("venue {id}")))
    }

    /// Search every venue.
    pub async fn search(&self, params: &SearchParams) -> Result<Page<Venue>> {
        self.venues.search(&venue_query(params, None)).await
    }

    /// Search the caller's venues; admins see all.
    pub async fn search_mine(&self, caller: &Caller, params: &SearchParams) -> Result<Page<Venue>> {
        let owner = (!caller.is_admin()).then(|| caller.id.clone());
        self.venues.search(&venue_query(params, owner)).await
    }

    /// Apply a partial update and refresh the snapshot on future events.
    pub async fn update(&self, caller: &Caller, id: &str, patch: VenuePatch) -> Result<Venue> {
        let mut venue = self.get(id).await?;
        ensure_manager(caller, &venue.owner_id)?;

        if let Some(name) = patch.name {
            venue.name = required(Some(&name)).ok_or_else(missing_fields)?;
        }
        if let Some(address) = patch.address {
            venue.address = required(Some(&address)).ok_or_else(missing_fields)?;
        }
        if let Some(city) = patch.city {
            venue.city = required(Some(&city)).ok_or_else(missing_fields)?;
        }
        if let Some(country) = patch.country {
            venue.country = required(Some(&country)).ok_or_else(missing_fields)?;
        }
        if let Some(capacity) = patch.capacity {
            venue.capacity = ensure_non_negative(capacity)?;
        }
        if let Some(amenities) = patch.amenities {
            venue.amenities = clean_amenities(amenities);
        }

        let now = Utc::now();
        venue.updated_at = now;
        if !self.venues.update(&venue).await? {
            return Err(EventHubError::not_found(ErrorCode::NotFound, format!("venue {id}")));
        }

        let refreshed = self.events.refresh_venue_snapshot(&venue, now).await?;
        let queued = refreshed.iter().filter(|e| e.has_live_mirror()).count();

        info!(
            venue_id = %venue.id,
            events_refreshed = refreshed.len(),
            calendar_updates = queued,
            "Venue updated"
        );
        Ok(venue)
    }

    /// Hard delete. Events keep their snapshot of the venue.
    pub async fn delete(&self, caller: &Caller, id: &str) -> Result<()> {
        let venue = self.get(id).await?;
        ensure_manager(caller, &venue.owner_id)?;

        if !self.venues.delete(id).await? {
            return Err(EventHubError::not_found(ErrorCode::NotFound, format!("venue {id}")));
        }
        info!(venue_id = %id, "Venue deleted");
        Ok(())
    }
}

fn venue_query(params: &SearchParams, owner_id: Option<String>) -> VenueQuery {
    let (limit, offset) = params.window();
    VenueQuery {
        search: params.search_text().map(str::to_owned),
        city: params.city_filter().map(str::to_owned),
        owner_id,
        sort: params.sort_or(VENUE_SORT_FIELDS, SortSpec::desc("created_at")),
        limit,
        offset,
    }
}

fn missing_fields() -> EventHubError {
    EventHubError::validation(
        ErrorCode::NameAddressCityCountryRequired,
        "name, address, city and country are required",
    )
}

fn clean_amenities(amenities: Vec<String>) -> Vec<String> {
    amenities
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}
