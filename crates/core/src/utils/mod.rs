//! Small helpers shared by the services

use eventhub_domain::{Caller, EventHubError, Result};

/// Fresh time-ordered record id.
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Trimmed value, or `None` when absent or blank.
pub fn required(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Only the owner or an admin may modify a record.
pub fn ensure_manager(caller: &Caller, owner_id: &str) -> Result<()> {
    if caller.can_manage(owner_id) {
        Ok(())
    } else {
        Err(EventHubError::Forbidden(format!("{} may not modify this record", caller.id)))
    }
}
