//! Reminder notifiers for tests.

use std::sync::Mutex;

use tokio::sync::Notify;

use async_trait::async_trait;
use eventhub_core::reminders::{ReminderMessage, ReminderNotifier};
use eventhub_domain::{EventHubError, Result};

/// Records every message; addresses listed in `fail_for` fail to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<ReminderMessage>>,
    pub fail_for: Vec<String>,
}

impl RecordingNotifier {
    pub fn failing_for(address: &str) -> Self {
        Self { sent: Mutex::default(), fail_for: vec![address.to_string()] }
    }

    pub fn sent(&self) -> Vec<ReminderMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReminderNotifier for RecordingNotifier {
    async fn send(&self, message: &ReminderMessage) -> Result<()> {
        if self.fail_for.contains(&message.to_email) {
            return Err(EventHubError::Network("mailbox unavailable".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Blocks every send until the test releases it.
#[derive(Default)]
pub struct GatedNotifier {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl ReminderNotifier for GatedNotifier {
    async fn send(&self, _message: &ReminderMessage) -> Result<()> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}
