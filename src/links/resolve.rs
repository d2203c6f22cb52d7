//! Short-link redirect resolution.
//!
//! A share link like `https://v.douyin.com/iAbCdEf/` carries no video ID;
//! the ID only appears in the URL the platform redirects to. The resolver
//! follows redirects, then extracts the ID from the final URL's path or
//! query parameters.

use crate::links::patterns::canonical_video_url;
use crate::links::LinkError;
use crate::retry::{with_retry, RetryPolicy, Retryable};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

/// Follows HTTP redirects and reports the final URL.
///
/// Abstracted behind a trait so resolution logic can be tested without a
/// network; the production implementation is [`HttpRedirectFollower`].
#[async_trait]
pub trait RedirectFollower: Send + Sync {
    /// Issue a GET with redirects enabled and return the final response URL.
    async fn final_url(&self, url: &str) -> Result<Url, LinkError>;
}

/// Redirect follower backed by a shared [`reqwest::Client`].
pub struct HttpRedirectFollower {
    client: Client,
    user_agent: String,
}

impl HttpRedirectFollower {
    /// Create a follower. The client should be built with a request timeout;
    /// redirect following is reqwest's default behavior.
    pub fn new(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl RedirectFollower for HttpRedirectFollower {
    async fn final_url(&self, url: &str) -> Result<Url, LinkError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    LinkError::InvalidUrl(e.to_string())
                } else {
                    LinkError::Network(e.to_string())
                }
            })?;
        Ok(response.url().clone())
    }
}

/// Extract a video ID from a fully-resolved URL.
///
/// Priority: (1) a numeric path segment in a canonical video/note/share path;
/// (2) a `vid`/`video_id`/`modal_id` query parameter. Returns `None` when the
/// final URL has neither, which callers report as a failed item rather than
/// an error.
pub fn extract_video_id(url: &Url) -> Option<String> {
    static PATH_ID: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"/(?:share/)?(?:video|note)/(\d+)").unwrap());

    if let Some(caps) = PATH_ID.captures(url.path()) {
        return Some(caps[1].to_string());
    }
    for (key, value) in url.query_pairs() {
        let named = matches!(key.as_ref(), "vid" | "video_id" | "modal_id");
        if named && !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            return Some(value.into_owned());
        }
    }
    None
}

/// Resolves short links to their canonical video URL.
pub struct RedirectResolver<F: RedirectFollower> {
    follower: F,
    retry_policy: RetryPolicy,
}

impl<F: RedirectFollower> RedirectResolver<F> {
    /// Create a resolver with the given follower and retry policy.
    pub fn new(follower: F, retry_policy: RetryPolicy) -> Self {
        Self {
            follower,
            retry_policy,
        }
    }

    /// Resolve a short URL to its canonical `/video/{id}` form.
    ///
    /// Network failures are retried per the policy. A final URL that yields
    /// no ID is a reported failure (`Ok(None)`), not an error: retrying
    /// cannot fix a missing ID.
    pub async fn resolve(&self, short_url: &str) -> Result<Option<String>, LinkError> {
        let final_url = with_retry(
            &self.retry_policy,
            LinkError::is_retryable,
            |error, attempt| {
                warn!(url = short_url, attempt, error = %error, "redirect request failed, retrying");
            },
            || self.follower.final_url(short_url),
        )
        .await?;

        match extract_video_id(&final_url) {
            Some(id) => Ok(Some(canonical_video_url(&id))),
            None => {
                debug!(url = short_url, final_url = %final_url, "final url carries no video id");
                Ok(None)
            }
        }
    }
}
