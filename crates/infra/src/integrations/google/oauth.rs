//! OAuth refresh-token credentials for the calendar API.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eventhub_core::{CalendarResult, CredentialProvider};
use eventhub_domain::constants::{GOOGLE_OAUTH_TOKEN_URL, TOKEN_REFRESH_MARGIN_SECS};
use eventhub_domain::{CalendarConfig, CalendarFailure};
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::api_failure;
use crate::http::HttpClient;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Exchanges a long-lived refresh token for short-lived access tokens.
///
/// The cache lock is held across the refresh request, so concurrent callers
/// wait for a single refresh instead of racing the token endpoint.
pub struct GoogleOAuthCredentials {
    http: HttpClient,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cache: Mutex<Option<CachedToken>>,
}

impl GoogleOAuthCredentials {
    pub fn new(
        http: HttpClient,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: GOOGLE_OAUTH_TOKEN_URL.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            cache: Mutex::new(None),
        }
    }

    /// Credentials from configuration, `None` unless all three secrets are set.
    pub fn from_config(config: &CalendarConfig, http: HttpClient) -> Option<Self> {
        if !config.has_credentials() {
            return None;
        }
        Some(Self::new(
            http,
            config.client_id.clone().unwrap_or_default(),
            config.client_secret.clone().unwrap_or_default(),
            config.refresh_token.clone().unwrap_or_default(),
        ))
    }

    /// Override the token endpoint.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    async fn refresh(&self) -> CalendarResult<CachedToken> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let request = self.http.request(Method::POST, &self.token_url).form(&form);

        let response = self
            .http
            .send(request)
            .await
            .map_err(|err| CalendarFailure::exception(format!("token refresh failed: {err}")))?;

        if !response.status().is_success() {
            let failure = api_failure(response).await;
            warn!(error = %failure, "Calendar token refresh rejected");
            return Err(failure);
        }

        let token: TokenResponse = response.json().await.map_err(|err| {
            CalendarFailure::exception(format!("failed to parse token response: {err}"))
        })?;

        info!(expires_in = token.expires_in, "Calendar access token refreshed");
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl CredentialProvider for GoogleOAuthCredentials {
    async fn access_token(&self) -> CalendarResult<String> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.as_ref().filter(|token| token.is_fresh(Utc::now())) {
            debug!("Using cached calendar access token");
            return Ok(token.access_token.clone());
        }

        let token = self.refresh().await?;
        let access_token = token.access_token.clone();
        *cache = Some(token);
        Ok(access_token)
    }

    async fn invalidate(&self) {
        if self.cache.lock().await.take().is_some() {
            info!("Cached calendar access token discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_refresh_five_minutes_early() {
        let now = Utc::now();
        let token = CachedToken { access_token: "a".into(), expires_at: now + Duration::seconds(301) };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::seconds(1)));
    }

    #[test]
    fn missing_secrets_yield_no_credentials() {
        let config = CalendarConfig { client_id: Some("id".into()), ..CalendarConfig::default() };
        assert!(GoogleOAuthCredentials::from_config(&config, HttpClient::new().unwrap()).is_none());
    }
}
