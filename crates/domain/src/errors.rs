//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::EventStatus;

/// Stable machine-readable error codes returned to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    TitleStartDateAndVenueRequired,
    NameAddressCityCountryRequired,
    VenueNotFound,
    NotFound,
    Forbidden,
    Unauthorized,
    CapacityExceedsVenueCapacity,
    CapacityBelowBookedSpots,
    InvalidCapacity,
    InvalidStatus,
    InvalidStatusTransition,
    InvalidDate,
    InvalidBody,
    InvalidWebhookSecret,
    WebhookProcessingError,
    ServerError,
}

impl ErrorCode {
    /// Wire representation of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TitleStartDateAndVenueRequired => "TITLE_START_DATE_AND_VENUE_REQUIRED",
            Self::NameAddressCityCountryRequired => "NAME_ADDRESS_CITY_COUNTRY_REQUIRED",
            Self::VenueNotFound => "VENUE_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::CapacityExceedsVenueCapacity => "CAPACITY_EXCEEDS_VENUE_CAPACITY",
            Self::CapacityBelowBookedSpots => "CAPACITY_BELOW_BOOKED_SPOTS",
            Self::InvalidCapacity => "INVALID_CAPACITY",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::InvalidStatusTransition => "INVALID_STATUS_TRANSITION",
            Self::InvalidDate => "INVALID_DATE",
            Self::InvalidBody => "INVALID_BODY",
            Self::InvalidWebhookSecret => "INVALID_WEBHOOK_SECRET",
            Self::WebhookProcessingError => "WEBHOOK_PROCESSING_ERROR",
            Self::ServerError => "SERVER_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for EventHub
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum EventHubError {
    #[error("Validation failed ({code}): {message}")]
    Validation { code: ErrorCode, message: String },

    #[error("Not found ({code}): {message}")]
    NotFound { code: ErrorCode, message: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {code}")]
    Unauthorized { code: ErrorCode },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: EventStatus, to: EventStatus },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EventHubError {
    /// Validation failure carrying a client-facing code.
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation { code, message: message.into() }
    }

    /// Missing resource carrying a client-facing code.
    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::NotFound { code, message: message.into() }
    }

    /// The stable code reported to API clients.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. }
            | Self::NotFound { code, .. }
            | Self::Unauthorized { code } => *code,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::InvalidTransition { .. } => ErrorCode::InvalidStatusTransition,
            Self::Database(_) | Self::Config(_) | Self::Network(_) | Self::Internal(_) => {
                ErrorCode::ServerError
            }
        }
    }

    /// True for failures caused by the caller rather than the server.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self.code(), ErrorCode::ServerError | ErrorCode::WebhookProcessingError)
    }
}

/// Result type alias for EventHub operations
pub type Result<T> = std::result::Result<T, EventHubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_in_screaming_case() {
        let json = serde_json::to_string(&ErrorCode::CapacityExceedsVenueCapacity).unwrap();
        assert_eq!(json, "\"CAPACITY_EXCEEDS_VENUE_CAPACITY\"");
        assert_eq!(ErrorCode::TitleStartDateAndVenueRequired.to_string(), "TITLE_START_DATE_AND_VENUE_REQUIRED");
    }

    #[test]
    fn infrastructure_errors_report_server_error() {
        assert_eq!(EventHubError::Database("locked".into()).code(), ErrorCode::ServerError);
        assert_eq!(EventHubError::Network("timeout".into()).code(), ErrorCode::ServerError);
        assert!(!EventHubError::Internal("boom".into()).is_client_error());
    }

    #[test]
    fn client_errors_keep_their_code() {
        let err = EventHubError::not_found(ErrorCode::VenueNotFound, "venue v-1");
        assert_eq!(err.code(), ErrorCode::VenueNotFound);
        assert!(err.is_client_error());

        let err = EventHubError::InvalidTransition {
            from: EventStatus::Completed,
            to: EventStatus::Draft,
        };
        assert_eq!(err.code(), ErrorCode::InvalidStatusTransition);
        assert_eq!(err.to_string(), "Invalid status transition: completed -> draft");
    }
}
