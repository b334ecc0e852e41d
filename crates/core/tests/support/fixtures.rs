//! Builders for callers, venues and events.

use chrono::{DateTime, Duration, Utc};
use eventhub_domain::{Caller, Event, EventDraft, EventStatus, Role, Venue};

pub fn user(id: &str) -> Caller {
    Caller {
        id: id.to_string(),
        name: format!("User {id}"),
        email: Some(format!("{id}@example.com")),
        role: Role::User,
    }
}

pub fn admin() -> Caller {
    Caller { id: "admin".into(), name: "Admin".into(), email: None, role: Role::Admin }
}

pub fn venue(id: &str, owner: &str, capacity: i64) -> Venue {
    let now = Utc::now();
    Venue {
        id: id.to_string(),
        name: format!("Venue {id}"),
        address: "1 Main St".into(),
        city: "Lyon".into(),
        country: "France".into(),
        capacity,
        amenities: vec!["wifi".into()],
        owner_id: owner.to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn event(id: &str, venue: &Venue, organizer: &str, start: DateTime<Utc>) -> Event {
    let now = Utc::now();
    Event {
        id: id.to_string(),
        title: format!("Event {id}"),
        description: None,
        start_date: start,
        end_date: None,
        venue_id: venue.id.clone(),
        venue_name: venue.name.clone(),
        venue_address: venue.address.clone(),
        venue_city: venue.city.clone(),
        venue_country: venue.country.clone(),
        capacity: 100,
        available_spots: 100,
        price: None,
        currency: None,
        status: EventStatus::Draft,
        category: None,
        image_url: None,
        registration_deadline: None,
        requires_approval: false,
        organizer_id: organizer.to_string(),
        organizer_name: format!("User {organizer}"),
        organizer_email: Some(format!("{organizer}@example.com")),
        google_calendar_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn draft(title: &str, venue_id: &str, status: Option<&str>) -> EventDraft {
    EventDraft {
        title: Some(title.to_string()),
        start_date: Some(in_days(7)),
        venue_id: Some(venue_id.to_string()),
        status: status.map(str::to_string),
        ..Default::default()
    }
}

pub fn in_days(days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(days)
}
