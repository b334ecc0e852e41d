use std::time::Duration;

use eventhub_domain::EventHubError;
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

const USER_AGENT: &str = concat!("eventhub/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by the calendar, OAuth and e-mail adapters.
///
/// `send` retries transport errors and 5xx responses with exponential
/// backoff; the last 5xx response is returned to the caller as-is.
/// `send_once` never retries.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    retry: RetryPolicy,
}

#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_attempts: usize,
    base_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based), doubling up to 2^8.
    fn delay(self, retry: usize) -> Duration {
        let shift = u32::try_from(retry.saturating_sub(1).min(8)).unwrap_or(8);
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    async fn pause(self, retry: usize) {
        let delay = self.delay(retry);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with the default timeout and retry policy.
    pub fn new() -> Result<Self, EventHubError> {
        Self::builder().build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute with retries. The body must be cloneable.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, EventHubError> {
        let attempts = self.retry.max_attempts;
        let mut attempt = 1;

        loop {
            let copy = builder.try_clone().ok_or_else(|| {
                EventHubError::Internal("request body cannot be cloned for retries".into())
            })?;
            let request = build_request(copy)?;
            let (method, url) = (request.method().clone(), redacted(request.url()));
            let last = attempt >= attempts;

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, %url, %status, "HTTP response");
                    if last || !status.is_server_error() {
                        return Ok(response);
                    }
                }
                Err(err) => {
                    debug!(attempt, %method, %url, error = %err, "HTTP request failed");
                    if last || !is_transient(&err) {
                        return Err(InfraError::from(err).into());
                    }
                }
            }

            self.retry.pause(attempt).await;
            attempt += 1;
        }
    }

    /// Execute once, without retries. For requests that are not idempotent.
    pub async fn send_once(&self, builder: RequestBuilder) -> Result<Response, EventHubError> {
        let request = build_request(builder)?;
        debug!(method = %request.method(), url = %redacted(request.url()), "HTTP request (no retry)");
        self.client.execute(request).await.map_err(|err| InfraError::from(err).into())
    }
}

fn build_request(builder: RequestBuilder) -> Result<Request, EventHubError> {
    builder.build().map_err(|err| EventHubError::from(InfraError::from(err)))
}

/// URL without its query string, which may carry secrets.
fn redacted(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    retry: RetryPolicy,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy { max_attempts: 3, base_backoff: Duration::from_millis(200) },
        }
    }
}

impl HttpClientBuilder {
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts, including the first one.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.retry.max_attempts = attempts.max(1);
        self
    }

    pub const fn base_backoff(mut self, backoff: Duration) -> Self {
        self.retry.base_backoff = backoff;
        self
    }

    pub fn build(self) -> Result<HttpClient, EventHubError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()
            .map_err(|err| EventHubError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, retry: self.retry })
    }
}
