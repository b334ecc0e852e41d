//! Port interfaces for reminder delivery

use async_trait::async_trait;
use eventhub_domain::Result;
use serde::Serialize;

/// A rendered reminder ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderMessage {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub html: String,
}

/// Delivers reminder messages
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn send(&self, message: &ReminderMessage) -> Result<()>;
}
