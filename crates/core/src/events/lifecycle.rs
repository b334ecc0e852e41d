//! Event lifecycle state machine
//!
//! Decides which calendar work a local write implies. The decision is made
//! while the write is prepared so the resulting [`SyncIntent`] can be stored
//! in the same transaction.

use eventhub_domain::{Event, EventHubError, EventStatus, Result, SyncAction, SyncIntent};

/// One side of a lifecycle step. `None` stands for "no record": the previous
/// side of a create or the next side of a delete.
pub type LifecycleSide = Option<EventStatus>;

/// Calendar action implied by moving from `previous` to `next`.
///
/// Rejects pairs the status table forbids.
pub fn plan(previous: LifecycleSide, next: LifecycleSide, has_mirror: bool) -> Result<Option<SyncAction>> {
    use EventStatus::Published;

    if let (Some(from), Some(to)) = (previous, next) {
        if !from.can_transition_to(to) {
            return Err(EventHubError::InvalidTransition { from, to });
        }
    }

    let action = match (previous, next, has_mirror) {
        (None, None, _) => None,

        // create
        (None, Some(Published), _) => Some(SyncAction::Publish),
        (None, Some(_), _) => None,

        // delete
        (Some(_), None, true) => Some(SyncAction::RetractDeleted),
        (Some(_), None, false) => None,

        // into or within published
        (Some(_), Some(Published), true) => Some(SyncAction::Upsert),
        (Some(_), Some(Published), false) => Some(SyncAction::Publish),

        // out of published
        (Some(Published), Some(_), true) => Some(SyncAction::Retract),
        (Some(Published), Some(_), false) => None,

        // between unpublished states; a stale mirror is left alone
        (Some(_), Some(_), _) => None,
    };

    Ok(action)
}

/// Build the outbox intent for `action` on `event`.
pub fn intent_for(event: &Event, action: SyncAction) -> SyncIntent {
    SyncIntent::new(event.id.clone(), action, event.mirror_id().map(str::to_owned))
}
