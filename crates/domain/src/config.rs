//! Configuration structures

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_OUTBOX_RETENTION_DAYS, DEFAULT_REMINDER_CRON, DEFAULT_SYNC_MAX_ATTEMPTS,
    GOOGLE_CALENDAR_API_BASE,
};
use crate::types::SpotsPolicy;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub calendar: CalendarConfig,
    pub webhook: WebhookConfig,
    pub email: EmailConfig,
    pub reminders: ReminderConfig,
    pub sync: SyncConfig,
    pub events: EventsConfig,
    /// Public base URL used in notification links.
    pub app_url: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0:8080".to_string(), cors_permissive: true }
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "eventhub.db".to_string(), pool_size: 8 }
    }
}

/// Token verification settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
}

/// External calendar credentials and target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub client_id: Option<String>,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub calendar_id: Option<String>,
    pub api_base_url: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            refresh_token: None,
            calendar_id: None,
            api_base_url: GOOGLE_CALENDAR_API_BASE.to_string(),
        }
    }
}

impl CalendarConfig {
    /// A calendar id is the minimum needed to mirror anything.
    pub fn calendar_id(&self) -> Option<&str> {
        self.calendar_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Whether a refresh token exchange is possible.
    pub fn has_credentials(&self) -> bool {
        [&self.client_id, &self.client_secret, &self.refresh_token]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

/// Push notification settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    #[serde(skip_serializing)]
    pub secret: Option<String>,
}

/// Transactional e-mail settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    #[serde(skip_serializing)]
    pub brevo_api_key: Option<String>,
    pub brevo_base_url: String,
    pub sender_email: String,
    pub sender_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            brevo_api_key: None,
            brevo_base_url: "https://api.brevo.com/v3".to_string(),
            sender_email: "noreply@eventhub.local".to_string(),
            sender_name: "EventHub".to_string(),
        }
    }
}

/// Reminder job settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub enabled: bool,
    pub cron: String,
    /// IANA zone used when formatting dates in messages.
    pub time_zone: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: DEFAULT_REMINDER_CRON.to_string(),
            time_zone: "UTC".to_string(),
        }
    }
}

/// Outbox worker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub batch_size: usize,
    pub max_attempts: u32,
    /// Days closed intents are kept; 0 keeps them forever.
    pub retention_days: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 15,
            batch_size: 50,
            max_attempts: DEFAULT_SYNC_MAX_ATTEMPTS,
            retention_days: DEFAULT_OUTBOX_RETENTION_DAYS,
        }
    }
}

/// Event rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub spots_policy: SpotsPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_not_serialized() {
        let mut config = Config::default();
        config.auth.jwt_secret = "s3cret".into();
        config.calendar.refresh_token = Some("1//refresh-xyz".into());
        config.webhook.secret = Some("whsec-9".into());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("s3cret"));
        assert!(!json.contains("refresh-xyz"));
        assert!(!json.contains("whsec-9"));
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"sync":{"max_attempts":9},"events":{"spots_policy":"clamp"}}"#)
                .unwrap();
        assert_eq!(config.sync.max_attempts, 9);
        assert_eq!(config.sync.batch_size, 50);
        assert_eq!(config.events.spots_policy, SpotsPolicy::Clamp);
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn calendar_requires_all_credentials() {
        let mut calendar = CalendarConfig {
            calendar_id: Some(" primary ".into()),
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            ..Default::default()
        };
        assert_eq!(calendar.calendar_id(), Some("primary"));
        assert!(!calendar.has_credentials());
        calendar.refresh_token = Some("rt".into());
        assert!(calendar.has_credentials());
    }
}
