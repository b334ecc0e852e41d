//! External service integrations

pub mod email;
pub mod google;

pub use email::{redact_email, BrevoNotifier, LoggingNotifier};
pub use google::{GoogleCalendarClient, GoogleOAuthCredentials};
