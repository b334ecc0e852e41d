#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use eventhub_api::auth::Claims;
use eventhub_api::{router, AppContext};
use eventhub_domain::Config;
use eventhub_infra::database::DbManager;
use eventhub_infra::http::HttpClient;
use eventhub_infra::integrations::{GoogleCalendarClient, LoggingNotifier};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "whsec-test";

/// Router over a fresh database. The calendar adapter is unconfigured so
/// intents stay queued.
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub router: Router,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");

        let mut config = Config::default();
        config.database.path = temp_dir.path().join("eventhub.db").to_string_lossy().into_owned();
        config.auth.jwt_secret = JWT_SECRET.into();
        config.webhook.secret = Some(WEBHOOK_SECRET.into());
        config.app_url = "https://events.example.com".into();

        let db = Arc::new(DbManager::new(&config.database.path, 4).expect("db should open"));
        db.run_migrations().expect("schema migrations should apply");

        let http = HttpClient::new().expect("http client should build");
        let calendar = GoogleCalendarClient::new(http, "http://127.0.0.1:9", None, None);

        let ctx = Arc::new(
            AppContext::with_adapters(config, db, Arc::new(calendar), Arc::new(LoggingNotifier))
                .expect("context should wire"),
        );
        Self { router: router(Arc::clone(&ctx)), ctx, _temp_dir: temp_dir }
    }

    /// Send one request and decode the JSON response body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.raw(builder.body(body).expect("request should build")).await
    }

    pub async fn raw(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body should read");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response should be JSON")
        };
        (status, json)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Signed token for `sub` with the given role.
pub fn token(sub: &str, role: &str) -> String {
    let claims = Claims {
        sub: sub.into(),
        name: format!("{sub} name"),
        email: Some(format!("{sub}@example.com")),
        role: role.into(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes()))
        .expect("token should encode")
}
