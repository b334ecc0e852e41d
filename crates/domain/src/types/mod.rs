//! Domain types and models

pub mod calendar;
pub mod caller;
pub mod event;
pub mod outbox;
pub mod search;
pub mod venue;

pub use calendar::{CalendarEventPayload, CalendarEventTime, CalendarFailure, RemoteCalendarEvent};
pub use caller::{Caller, Role};
pub use event::{Event, EventDraft, EventPatch, EventStatus, SpotsPolicy};
pub use outbox::{OutboxStats, OutboxStatus, SyncAction, SyncIntent};
pub use search::{EventQuery, Page, SearchParams, SortDirection, SortSpec, VenueQuery};
pub use venue::{Venue, VenueDraft, VenuePatch};
