//! Capacity rules shared by event create and update

use eventhub_domain::{ErrorCode, EventHubError, Result, SpotsPolicy, Venue};

/// Reject negative capacities.
pub fn ensure_non_negative(capacity: i64) -> Result<i64> {
    if capacity < 0 {
        return Err(EventHubError::validation(
            ErrorCode::InvalidCapacity,
            format!("capacity must be >= 0, got {capacity}"),
        ));
    }
    Ok(capacity)
}

/// Reject an event capacity the venue cannot hold. Unlimited venues admit
/// anything.
pub fn ensure_fits_venue(capacity: i64, venue: &Venue) -> Result<()> {
    if venue.admits(capacity) {
        Ok(())
    } else {
        Err(EventHubError::validation(
            ErrorCode::CapacityExceedsVenueCapacity,
            format!("capacity {capacity} exceeds venue capacity {}", venue.capacity),
        ))
    }
}

/// Available spots after a capacity change, keeping the booked count.
///
/// `booked = old_capacity - old_available`, `available = new_capacity - booked`.
pub fn recompute_available(
    old_capacity: i64,
    old_available: i64,
    new_capacity: i64,
    policy: SpotsPolicy,
) -> Result<i64> {
    let booked = old_capacity - old_available;
    let available = new_capacity - booked;

    if available >= 0 {
        return Ok(available);
    }

    match policy {
        SpotsPolicy::Reject => Err(EventHubError::validation(
            ErrorCode::CapacityBelowBookedSpots,
            format!("capacity {new_capacity} is below the {booked} spots already booked"),
        )),
        SpotsPolicy::Clamp => Ok(0),
        SpotsPolicy::AllowNegative => Ok(available),
    }
}
