//! Calendar push notification handling.

mod support;

use std::sync::Arc;

use eventhub_core::{WebhookAck, WebhookNotification, WebhookService};
use eventhub_domain::{ErrorCode, EventHubError, EventStatus, SyncAction};
use support::fixtures::{event, in_days, venue};
use support::store::{FlakyOutbox, MemoryStore};

fn mirrored(id: &str, mirror: &str, status: EventStatus) -> eventhub_domain::Event {
    let v = venue("v-1", "owner", 0);
    let mut e = event(id, &v, "u-1", in_days(2));
    e.status = status;
    e.google_calendar_id = Some(mirror.to_string());
    e
}

fn notification(state: &str, uri: Option<&str>) -> WebhookNotification {
    WebhookNotification {
        resource_state: Some(state.to_string()),
        resource_id: Some("res-1".into()),
        resource_uri: uri.map(str::to_string),
        message_number: None,
        secret: Some("hook-secret".into()),
    }
}

fn service(store: &Arc<MemoryStore>) -> WebhookService {
    WebhookService::new(store.clone(), store.clone(), Some("hook-secret".into()))
}

#[tokio::test]
async fn wrong_secret_is_unauthorized() {
    let store = Arc::new(MemoryStore::default());
    let mut bad = notification("sync", None);
    bad.secret = Some("nope".into());

    let err = service(&store).handle(&bad).await.unwrap_err();
    assert_eq!(err, EventHubError::Unauthorized { code: ErrorCode::InvalidWebhookSecret });

    bad.secret = None;
    assert!(service(&store).handle(&bad).await.is_err());
}

#[tokio::test]
async fn no_configured_secret_accepts_anything() {
    let store = Arc::new(MemoryStore::default());
    let service = WebhookService::new(store.clone(), store.clone(), Some(String::new()));
    let mut anonymous = notification("sync", None);
    anonymous.secret = None;

    assert_eq!(service.handle(&anonymous).await.unwrap(), WebhookAck::SyncReceived);
}

#[tokio::test]
async fn remote_deletion_cancels_published_event_and_clears_mirror() {
    let store = Arc::new(MemoryStore::default().with_event(mirrored("e-1", "abc@1", EventStatus::Published)));
    let uri = "https://www.googleapis.com/calendar/v3/calendars/primary/events/abc%401?alt=json";

    let ack = service(&store).handle(&notification("not_exists", Some(uri))).await.unwrap();

    assert_eq!(ack.message(), "deletion_processed");
    let event = store.event("e-1").unwrap();
    assert_eq!(event.status, EventStatus::Cancelled);
    assert!(event.google_calendar_id.is_none());
    assert!(store.intents().is_empty(), "nothing left to retract");
}

#[tokio::test]
async fn remote_edit_queues_local_state() {
    let store = Arc::new(
        MemoryStore::default()
            .with_event(mirrored("e-1", "g-1", EventStatus::Published))
            .with_event(mirrored("e-2", "g-2", EventStatus::Draft)),
    );
    let service = service(&store);

    let ack = service.handle(&notification("exists", Some("https://x/events/g-1"))).await.unwrap();
    assert_eq!(ack, WebhookAck::UpdateReceived);
    service.handle(&notification("exists", Some("https://x/events/g-2"))).await.unwrap();

    let intents = store.intents();
    assert_eq!(intents.iter().map(|i| i.action).collect::<Vec<_>>(), vec![SyncAction::Upsert, SyncAction::Retract]);
    assert_eq!(intents[0].event_id, "e-1");
    assert_eq!(intents[1].mirror_id.as_deref(), Some("g-2"));
}

#[tokio::test]
async fn unknown_ids_and_states_are_acknowledged() {
    let store = Arc::new(MemoryStore::default());
    let service = service(&store);

    let ack = service.handle(&notification("not_exists", Some("https://x/events/nobody"))).await.unwrap();
    assert_eq!(ack, WebhookAck::DeletionProcessed);
    let ack = service.handle(&notification("mystery", None)).await.unwrap();
    assert_eq!(ack, WebhookAck::Acknowledged);
}

#[tokio::test]
async fn repeated_message_numbers_are_applied_once() {
    let store = Arc::new(MemoryStore::default().with_event(mirrored("e-1", "g-1", EventStatus::Published)));
    let service = service(&store);
    let mut message = notification("exists", Some("https://x/events/g-1"));
    message.message_number = Some("42".into());

    service.handle(&message).await.unwrap();
    service.handle(&message).await.unwrap();

    assert_eq!(store.intents().len(), 1);
}

#[tokio::test]
async fn failed_notifications_are_applied_on_redelivery() {
    let store = Arc::new(MemoryStore::default().with_event(mirrored("e-1", "g-1", EventStatus::Published)));
    let outbox = Arc::new(FlakyOutbox::failing(store.clone(), 1));
    let service = WebhookService::new(store.clone(), outbox, Some("hook-secret".into()));
    let mut message = notification("exists", Some("https://x/events/g-1"));
    message.message_number = Some("7".into());

    let first = service.handle(&message).await;
    assert!(matches!(first, Err(EventHubError::Database(_))));
    assert!(store.intents().is_empty());

    let second = service.handle(&message).await.unwrap();
    assert_eq!(second, WebhookAck::UpdateReceived);
    assert_eq!(store.actions(), vec![SyncAction::Upsert]);
}

#[tokio::test]
async fn remote_echoes_do_not_stack_reconciliation_intents() {
    let store = Arc::new(MemoryStore::default().with_event(mirrored("e-1", "g-1", EventStatus::Published)));
    let service = service(&store);

    for number in ["10", "11", "12"] {
        let mut message = notification("exists", Some("https://x/events/g-1"));
        message.message_number = Some(number.into());
        service.handle(&message).await.unwrap();
    }

    assert_eq!(store.actions(), vec![SyncAction::Upsert]);
}

#[tokio::test]
async fn calendar_level_notifications_are_acknowledged_without_changes() {
    let store = Arc::new(MemoryStore::default().with_event(mirrored("e-1", "g-1", EventStatus::Published)));
    let uri = "https://www.googleapis.com/calendar/v3/calendars/primary/events?alt=json";

    let ack = service(&store).handle(&notification("exists", Some(uri))).await.unwrap();

    assert_eq!(ack, WebhookAck::UpdateReceived);
    assert!(store.intents().is_empty());
    assert_eq!(store.event("e-1").unwrap().status, EventStatus::Published);
}
