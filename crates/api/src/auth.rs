//! Bearer token authentication
//!
//! Tokens are HS256 JWTs issued elsewhere; this service only verifies them
//! and turns the claims into a [`Caller`].

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use eventhub_domain::{Caller, ErrorCode, EventHubError, Role};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::AppContext;
use crate::routes::AppError;

/// Claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: String,
    pub exp: usize,
}

impl Claims {
    fn into_caller(self) -> Result<Caller, EventHubError> {
        if self.sub.trim().is_empty() {
            return Err(unauthorized());
        }
        let role = if self.role.is_empty() {
            Role::User
        } else {
            Role::from_str(&self.role).map_err(|_| unauthorized())?
        };
        Ok(Caller { id: self.sub, name: self.name, email: self.email, role })
    }
}

/// Verifies bearer tokens against the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl TokenVerifier {
    /// An empty secret yields a verifier that rejects everything.
    pub fn new(secret: &str) -> Self {
        let key = (!secret.is_empty()).then(|| DecodingKey::from_secret(secret.as_bytes()));
        Self { key, validation: Validation::new(Algorithm::HS256) }
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    /// Resolve the caller from an `Authorization` header value.
    pub fn verify(&self, header: Option<&str>) -> Result<Caller, EventHubError> {
        let key = self.key.as_ref().ok_or_else(unauthorized)?;
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(unauthorized)?;

        let data = decode::<Claims>(token, key, &self.validation).map_err(|err| {
            debug!(error = %err, "Rejected bearer token");
            unauthorized()
        })?;
        data.claims.into_caller()
    }
}

fn unauthorized() -> EventHubError {
    EventHubError::Unauthorized { code: ErrorCode::Unauthorized }
}

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Caller);

impl FromRequestParts<Arc<AppContext>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        Ok(Self(state.tokens.verify(header)?))
    }
}

/// An authenticated caller with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Caller);

impl FromRequestParts<Arc<AppContext>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(caller) = AuthUser::from_request_parts(parts, state).await?;
        if !caller.is_admin() {
            return Err(EventHubError::Forbidden("admin role required".into()).into());
        }
        Ok(Self(caller))
    }
}
