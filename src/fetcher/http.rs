//! Unified HTTP client for the platform's private JSON API.
//!
//! Wraps a shared [`reqwest::Client`] with header handling, status
//! classification, and retry with exponential backoff. The cookie string is
//! passed through verbatim; this client never inspects its contents.

use crate::config::DEFAULT_USER_AGENT;
use crate::fetcher::{FetcherError, FetcherResult};
use crate::retry::{with_retry, RetryPolicy, Retryable};
use metrics::counter;
use reqwest::header::{COOKIE, REFERER, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Base URL for the platform's web API.
pub const API_BASE_URL: &str = "https://www.douyin.com";

/// Endpoint listing a user's posted videos (cursor-paginated).
pub const POST_LIST_ENDPOINT: &str = "/aweme/v1/web/aweme/post/";

/// Endpoint returning a single video's detail payload.
pub const DETAIL_ENDPOINT: &str = "/aweme/v1/web/aweme/detail/";

/// HTTP client for all JSON API interactions.
#[derive(Clone)]
pub struct ApiHttpClient {
    client: Client,
    base_url: String,
    user_agent: String,
    cookie: Option<String>,
    retry_policy: RetryPolicy,
}

impl ApiHttpClient {
    /// Create a client over a shared transport.
    pub fn new(client: Client, base_url: impl Into<String>, retry_policy: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie: None,
            retry_policy,
        }
    }

    /// Attach an opaque cookie string, forwarded verbatim on every request.
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }

    /// Override the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a GET request and deserialize the JSON response.
    ///
    /// Transient failures (timeouts, 5xx, 429, 408) are retried with
    /// exponential backoff; other 4xx responses fail immediately.
    pub async fn get_json<T>(&self, endpoint: &str, params: &[(&str, String)]) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, params = params.len(), "GET request");
        with_retry(
            &self.retry_policy,
            FetcherError::is_retryable,
            |error, attempt| {
                counter!("http_retries_total").increment(1);
                warn!(url = %url, attempt, error = %error, "request failed, retrying");
            },
            || self.send(&url, params),
        )
        .await
    }

    async fn send<T>(&self, url: &str, params: &[(&str, String)]) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .get(url)
            .query(params)
            .header(USER_AGENT, &self.user_agent)
            .header(REFERER, &self.base_url);
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetcherError::Network(format!("timeout: {e}"))
            } else {
                FetcherError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetcherError::RateLimited);
        }
        if matches!(status.as_u16(), 401 | 403) {
            return Err(FetcherError::AccessDenied(status.to_string()));
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(FetcherError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetcherError::Parse(format!("failed to deserialize response: {e}")))
    }
}
