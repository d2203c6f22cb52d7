//! Remote data acquisition: the private JSON listing API and detail lookups.

use crate::retry::Retryable;

pub mod detail;
pub mod http;
pub mod pagination;
pub mod response;

pub use detail::ApiDetailExtractor;
pub use http::ApiHttpClient;
pub use pagination::{FetchOptions, HttpPostPageSource, PaginatedFetcher, PostPageSource};
pub use response::{Cursor, HasMore, PostItem, PostListResponse};

/// Fetcher errors.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Transport failure (timeout, connection reset, DNS).
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status outside the dedicated categories.
    #[error("HTTP error {status}: {message}")]
    HttpStatus {
        /// Response status code.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// HTTP 429 from the platform.
    #[error("rate limit exceeded")]
    RateLimited,

    /// HTTP 401/403: the cookie is missing, expired, or insufficient.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Response body could not be deserialized.
    #[error("parse error: {0}")]
    Parse(String),

    /// Response deserialized but violates the expected structure.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for fetcher operations.
pub type FetcherResult<T> = Result<T, FetcherError>;

impl Retryable for FetcherError {
    fn is_retryable(&self) -> bool {
        match self {
            FetcherError::Network(_) | FetcherError::RateLimited => true,
            FetcherError::HttpStatus { status, .. } => {
                matches!(status, 408 | 429) || *status >= 500
            }
            FetcherError::AccessDenied(_)
            | FetcherError::Parse(_)
            | FetcherError::InvalidResponse(_) => false,
        }
    }
}
