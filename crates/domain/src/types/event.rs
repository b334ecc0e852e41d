//! Event records, status lifecycle and capacity policy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::venue::Venue;

/// Closed set of event statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Cancelled,
    Completed,
}

crate::impl_status_conversions!(EventStatus {
    Draft => "draft",
    Published => "published",
    Cancelled => "cancelled",
    Completed => "completed",
});

impl EventStatus {
    /// Whether an event may move from `self` to `next`.
    ///
    /// | from      | to                                       |
    /// |-----------|------------------------------------------|
    /// | draft     | draft, published, cancelled              |
    /// | published | published, draft, cancelled, completed   |
    /// | cancelled | cancelled, draft, published              |
    /// | completed | completed                                |
    pub const fn can_transition_to(self, next: Self) -> bool {
        use EventStatus::{Cancelled, Completed, Draft, Published};

        match (self, next) {
            (Draft, Draft | Published | Cancelled)
            | (Published, Published | Draft | Cancelled | Completed)
            | (Cancelled, Cancelled | Draft | Published)
            | (Completed, Completed) => true,
            (Draft | Cancelled, Completed) | (Completed, Draft | Published | Cancelled) => false,
        }
    }

    /// Only published events are visible publicly and mirrored.
    pub const fn is_published(self) -> bool {
        matches!(self, Self::Published)
    }
}

/// How `available_spots` is recomputed when capacity shrinks below the
/// number of spots already booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotsPolicy {
    /// Refuse the update.
    #[default]
    Reject,
    /// Floor available spots at zero.
    Clamp,
    /// Keep the raw difference, possibly negative.
    AllowNegative,
}

crate::impl_status_conversions!(SpotsPolicy {
    Reject => "reject",
    Clamp => "clamp",
    AllowNegative => "allow_negative",
});

/// An event with a denormalized snapshot of its venue and organizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub venue_id: String,
    pub venue_name: String,
    pub venue_address: String,
    pub venue_city: String,
    pub venue_country: String,
    pub capacity: i64,
    pub available_spots: i64,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub status: EventStatus,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub requires_approval: bool,
    pub organizer_id: String,
    pub organizer_name: String,
    pub organizer_email: Option<String>,
    pub google_calendar_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Spots already taken, derived from capacity and availability.
    pub const fn booked_spots(&self) -> i64 {
        self.capacity - self.available_spots
    }

    /// Address, city and country joined with `", "`, skipping blanks.
    pub fn location(&self) -> String {
        [&self.venue_address, &self.venue_city, &self.venue_country]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Mirror id when the event has a copy in the external calendar.
    pub fn mirror_id(&self) -> Option<&str> {
        self.google_calendar_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Published with a remote copy that venue changes must reach.
    pub fn has_live_mirror(&self) -> bool {
        self.status.is_published() && self.mirror_id().is_some()
    }

    /// Copy the venue's identifying fields onto the event.
    pub fn apply_venue_snapshot(&mut self, venue: &Venue) {
        self.venue_id.clone_from(&venue.id);
        self.venue_name.clone_from(&venue.name);
        self.venue_address.clone_from(&venue.address);
        self.venue_city.clone_from(&venue.city);
        self.venue_country.clone_from(&venue.country);
    }
}

/// Request body for creating an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub venue_id: Option<String>,
    pub capacity: Option<i64>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub requires_approval: Option<bool>,
}

/// Partial update for an event; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub venue_id: Option<String>,
    pub capacity: Option<i64>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub requires_approval: Option<bool>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn transition_table_matches_lifecycle() {
        use EventStatus::{Cancelled, Completed, Draft, Published};

        let allowed = [
            (Draft, Draft),
            (Draft, Published),
            (Draft, Cancelled),
            (Published, Published),
            (Published, Draft),
            (Published, Cancelled),
            (Published, Completed),
            (Cancelled, Cancelled),
            (Cancelled, Draft),
            (Cancelled, Published),
            (Completed, Completed),
        ];

        for from in EventStatus::ALL {
            for to in EventStatus::ALL {
                let expected = allowed.contains(&(*from, *to));
                assert_eq!(from.can_transition_to(*to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn statuses_parse_from_wire_strings() {
        assert_eq!(EventStatus::from_str("published").unwrap(), EventStatus::Published);
        assert_eq!(EventStatus::from_str("Cancelled").unwrap(), EventStatus::Cancelled);
        assert!(EventStatus::from_str("archived").is_err());
        assert_eq!(EventStatus::default(), EventStatus::Draft);
    }

    #[test]
    fn spots_policy_parses_snake_case() {
        assert_eq!(SpotsPolicy::from_str("allow_negative").unwrap(), SpotsPolicy::AllowNegative);
        let json = serde_json::to_string(&SpotsPolicy::Clamp).unwrap();
        assert_eq!(json, "\"clamp\"");
    }

    #[test]
    fn draft_accepts_rfc3339_dates() {
        let draft: EventDraft = serde_json::from_str(
            r#"{"title":"Launch","start_date":"2030-05-01T18:00:00+02:00","venue_id":"v-1"}"#,
        )
        .unwrap();
        let start = draft.start_date.unwrap();
        assert_eq!(start.to_rfc3339(), "2030-05-01T16:00:00+00:00");
        assert!(draft.capacity.is_none());
    }
}
