//! Abstract browser collaborators.
//!
//! The core never owns a browser. A [`PageHandle`] is an explicit capability
//! passed in by the integration layer, which also owns the process lifecycle,
//! launch flags, and stealth concerns. A page is not reentrant: callers must
//! never run two extractions against the same page instance concurrently;
//! true concurrency requires one page per worker.

use crate::fetcher::FetcherError;
use crate::links::ParseResult;
use crate::retry::Retryable;
use crate::VideoInfo;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Errors surfaced by page-driven extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Navigation did not complete.
    #[error("page navigation failed: {0}")]
    Navigation(String),

    /// The readiness selector never appeared.
    #[error("timed out waiting for selector {0}")]
    SelectorTimeout(String),

    /// In-page script evaluation failed.
    #[error("page evaluation failed: {0}")]
    Evaluation(String),

    /// The page produced data that does not validate into a domain record.
    #[error("extracted payload invalid: {0}")]
    InvalidPayload(String),

    /// API-backed extraction failed upstream.
    #[error(transparent)]
    Fetch(#[from] FetcherError),
}

impl Retryable for ExtractError {
    fn is_retryable(&self) -> bool {
        match self {
            // An unstable page can succeed on a fresh navigation.
            ExtractError::Navigation(_)
            | ExtractError::SelectorTimeout(_)
            | ExtractError::Evaluation(_) => true,
            ExtractError::InvalidPayload(_) => false,
            ExtractError::Fetch(e) => e.is_retryable(),
        }
    }
}

/// Minimal browser-page capability the core consumes.
///
/// Failures inside the implementation (devtools protocol, process crash)
/// surface as the generic [`ExtractError`] variants; the core never inspects
/// them further.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Navigate to a URL and wait for the load event.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), ExtractError>;
    /// Wait until a CSS selector is present.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), ExtractError>;
    /// Evaluate a script in page context and return its JSON result.
    async fn evaluate(&self, script: &str) -> Result<Value, ExtractError>;
    /// Inject an opaque cookie string for a domain. Contents are never inspected.
    async fn set_cookies(&self, cookie: &str, domain: &str) -> Result<(), ExtractError>;
}

/// Produces one video's metadata from a normalized link.
#[async_trait]
pub trait VideoDetailExtractor: Send + Sync {
    /// Extract the full record for a single normalized link.
    async fn extract(&self, link: &ParseResult) -> Result<VideoInfo, ExtractError>;
}

/// Adapts a [`PageHandle`] into a [`VideoDetailExtractor`].
///
/// The readiness selector and the extraction script are supplied by the
/// integration layer; the adapter only sequences navigate / wait / evaluate
/// and validates the returned JSON against the detail wire shape.
pub struct PageDetailExtractor<P: PageHandle> {
    page: P,
    selector: String,
    script: String,
    timeout: Duration,
}

impl<P: PageHandle> PageDetailExtractor<P> {
    /// Create an adapter with the given readiness selector and extraction script.
    pub fn new(page: P, selector: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            page,
            selector: selector.into(),
            script: script.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Override the navigation/selector timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Forward an opaque cookie string to the page.
    pub async fn apply_cookies(&self, cookie: &str, domain: &str) -> Result<(), ExtractError> {
        self.page.set_cookies(cookie, domain).await
    }
}

#[async_trait]
impl<P: PageHandle> VideoDetailExtractor for PageDetailExtractor<P> {
    async fn extract(&self, link: &ParseResult) -> Result<VideoInfo, ExtractError> {
        self.page.navigate(&link.standard_url, self.timeout).await?;
        self.page
            .wait_for_selector(&self.selector, self.timeout)
            .await?;
        let value = self.page.evaluate(&self.script).await?;
        let item: crate::fetcher::PostItem = serde_json::from_value(value)
            .map_err(|e| ExtractError::InvalidPayload(e.to_string()))?;
        item.into_video_info()
            .map_err(|e| ExtractError::InvalidPayload(e.to_string()))
    }
}
