//! Reminder delivery
//!
//! [`BrevoNotifier`] sends transactional e-mail through the Brevo API;
//! [`LoggingNotifier`] only logs and is used when no API key is configured.

use async_trait::async_trait;
use eventhub_core::{ReminderMessage, ReminderNotifier};
use eventhub_domain::{EmailConfig, EventHubError, Result};
use reqwest::Method;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::http::HttpClient;

/// Short stable tag for an e-mail address, safe to log.
pub fn redact_email(address: &str) -> String {
    let digest = Sha256::digest(address.trim().to_lowercase().as_bytes());
    format!("sha256:{}", &hex::encode(digest)[..12])
}

#[derive(Debug, Serialize)]
struct Contact<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: Contact<'a>,
    to: [Contact<'a>; 1],
    subject: &'a str,
    html_content: &'a str,
}

/// Brevo transactional e-mail (`POST {base}/smtp/email`).
pub struct BrevoNotifier {
    http: HttpClient,
    base_url: String,
    api_key: String,
    sender_email: String,
    sender_name: String,
}

impl BrevoNotifier {
    pub fn new(http: HttpClient, config: &EmailConfig, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: config.brevo_base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            sender_email: config.sender_email.clone(),
            sender_name: config.sender_name.clone(),
        }
    }
}

#[async_trait]
impl ReminderNotifier for BrevoNotifier {
    async fn send(&self, message: &ReminderMessage) -> Result<()> {
        let body = SendEmailRequest {
            sender: Contact { email: &self.sender_email, name: &self.sender_name },
            to: [Contact { email: &message.to_email, name: &message.to_name }],
            subject: &message.subject,
            html_content: &message.html,
        };
        let request = self
            .http
            .request(Method::POST, format!("{}/smtp/email", self.base_url))
            .header("api-key", &self.api_key)
            .json(&body);

        let response = self.http.send_once(request).await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(recipient = %redact_email(&message.to_email), %status, "Brevo rejected e-mail");
            return Err(EventHubError::Network(format!("brevo returned {status}: {detail}")));
        }

        info!(recipient = %redact_email(&message.to_email), "Reminder e-mail sent");
        Ok(())
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl ReminderNotifier for LoggingNotifier {
    async fn send(&self, message: &ReminderMessage) -> Result<()> {
        info!(
            recipient = %redact_email(&message.to_email),
            subject = %message.subject,
            "E-mail delivery not configured, reminder logged only"
        );
        Ok(())
    }
}
