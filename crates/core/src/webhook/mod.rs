//! Calendar push notifications

pub mod service;

pub use service::{event_id_from_uri, ResourceState, WebhookAck, WebhookNotification, WebhookService};
