//! Scriptable in-memory calendar.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use eventhub_core::{CalendarGateway, CalendarResult};
use eventhub_domain::{CalendarEventPayload, CalendarFailure, RemoteCalendarEvent};

/// Calls observed by the fake, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarCall {
    Add,
    Update(String),
    Delete(String),
    Find(String),
}

/// Keeps remote events in a map. Queued failures are returned by the next
/// call of any kind before the map is consulted.
pub struct FakeCalendar {
    configured: bool,
    remote: Mutex<HashMap<String, CalendarEventPayload>>,
    failures: Mutex<VecDeque<CalendarFailure>>,
    calls: Mutex<Vec<CalendarCall>>,
    next_id: Mutex<u32>,
}

impl Default for FakeCalendar {
    fn default() -> Self {
        Self {
            configured: true,
            remote: Mutex::default(),
            failures: Mutex::default(),
            calls: Mutex::default(),
            next_id: Mutex::new(1),
        }
    }
}

impl FakeCalendar {
    pub fn unconfigured() -> Self {
        Self { configured: false, ..Self::default() }
    }

    pub fn with_remote(self, id: &str, summary: &str) -> Self {
        self.remote.lock().unwrap().insert(id.to_string(), payload(summary));
        self
    }

    pub fn with_remote_payload(self, id: &str, payload: CalendarEventPayload) -> Self {
        self.remote.lock().unwrap().insert(id.to_string(), payload);
        self
    }

    pub fn fail_next(&self, failure: CalendarFailure) {
        self.failures.lock().unwrap().push_back(failure);
    }

    pub fn calls(&self) -> Vec<CalendarCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn remote(&self, id: &str) -> Option<CalendarEventPayload> {
        self.remote.lock().unwrap().get(id).cloned()
    }

    pub fn remote_count(&self) -> usize {
        self.remote.lock().unwrap().len()
    }

    fn begin(&self, call: CalendarCall) -> CalendarResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().pop_front() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

fn payload(summary: &str) -> CalendarEventPayload {
    let time = eventhub_domain::CalendarEventTime::utc(chrono::Utc::now());
    CalendarEventPayload {
        summary: summary.to_string(),
        description: String::new(),
        location: String::new(),
        start: time.clone(),
        end: time,
    }
}

fn remote_event(id: &str, payload: &CalendarEventPayload) -> RemoteCalendarEvent {
    RemoteCalendarEvent {
        id: id.to_string(),
        status: Some("confirmed".into()),
        summary: Some(payload.summary.clone()),
        description: Some(payload.description.clone()),
        location: Some(payload.location.clone()),
        start: Some(payload.start.clone()),
        end: Some(payload.end.clone()),
        html_link: None,
    }
}

#[async_trait]
impl CalendarGateway for FakeCalendar {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn add(&self, payload: &CalendarEventPayload) -> CalendarResult<String> {
        self.begin(CalendarCall::Add)?;
        let mut next = self.next_id.lock().unwrap();
        let id = format!("g-{next}");
        *next += 1;
        self.remote.lock().unwrap().insert(id.clone(), payload.clone());
        Ok(id)
    }

    async fn update(
        &self,
        external_id: &str,
        payload: &CalendarEventPayload,
    ) -> CalendarResult<RemoteCalendarEvent> {
        self.begin(CalendarCall::Update(external_id.to_string()))?;
        let mut remote = self.remote.lock().unwrap();
        match remote.get_mut(external_id) {
            Some(existing) => {
                *existing = payload.clone();
                Ok(remote_event(external_id, payload))
            }
            None => Err(CalendarFailure::ApiError { status: 404, message: "Not Found".into() }),
        }
    }

    async fn delete(&self, external_id: &str) -> CalendarResult<()> {
        self.begin(CalendarCall::Delete(external_id.to_string()))?;
        self.remote.lock().unwrap().remove(external_id);
        Ok(())
    }

    async fn find(&self, external_id: &str) -> CalendarResult<Option<RemoteCalendarEvent>> {
        self.begin(CalendarCall::Find(external_id.to_string()))?;
        Ok(self.remote.lock().unwrap().get(external_id).map(|p| remote_event(external_id, p)))
    }
}
