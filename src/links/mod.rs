//! Link extraction, classification, and normalization.
//!
//! Free-form text goes through [`extract_links`], each candidate URL is
//! classified against the ordered pattern registry, short links are resolved
//! through HTTP redirects, and everything funnels into a canonical
//! [`ParseResult`] per input.

use crate::retry::Retryable;

pub mod extract;
pub mod normalize;
pub mod patterns;
pub mod resolve;

pub use extract::extract_links;
pub use normalize::{LinkNormalizer, ParseResult};
pub use patterns::{canonical_user_url, canonical_video_url, classify, LinkPattern, LinkType};
pub use resolve::{HttpRedirectFollower, RedirectFollower, RedirectResolver};

/// Link-layer errors.
///
/// "Cannot extract an ID" is deliberately not an error here: normalization
/// reports it as `None` (or [`LinkError::Unresolvable`] when a batch needs a
/// per-item record) because malformed and expired share links are the common
/// case, not the exceptional one.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport-level failure while following redirects.
    #[error("network error: {0}")]
    Network(String),

    /// Input that is not a parseable URL at all.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// No recognized pattern or no extractable ID for this input.
    #[error("unresolvable link: {0}")]
    Unresolvable(String),
}

impl Retryable for LinkError {
    fn is_retryable(&self) -> bool {
        // Retrying cannot conjure an ID that is structurally absent.
        matches!(self, LinkError::Network(_))
    }
}
