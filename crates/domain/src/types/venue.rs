//! Venue records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A place that hosts events. `capacity == 0` means unlimited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub capacity: i64,
    pub amenities: Vec<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Venue {
    /// True when the venue puts no ceiling on event capacity.
    pub const fn is_unlimited(&self) -> bool {
        self.capacity == 0
    }

    /// Whether an event of `capacity` fits in this venue.
    pub const fn admits(&self, capacity: i64) -> bool {
        self.is_unlimited() || capacity <= self.capacity
    }
}

/// Request body for creating a venue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueDraft {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub capacity: Option<i64>,
    pub amenities: Option<Vec<String>>,
}

/// Partial update for a venue; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenuePatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub capacity: Option<i64>,
    pub amenities: Option<Vec<String>>,
}
