//! Link normalization: classify, resolve, and canonicalize.

use crate::batch::{process_batch, BatchOptions, BatchOutcome};
use crate::links::patterns::{
    canonical_user_url, canonical_video_url, capture_id, classify, LinkType,
};
use crate::links::resolve::{extract_video_id, RedirectFollower, RedirectResolver};
use crate::links::LinkError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

/// A normalized link: the resource ID plus its canonical URL.
///
/// `standard_url` is always re-derivable from `id` alone, so two inputs in
/// different share formats that point at the same video normalize to the same
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Platform-assigned resource ID.
    pub id: String,
    /// Canonical URL derived from the ID.
    pub standard_url: String,
    /// The input URL as given.
    pub original_url: String,
    /// Resource kind.
    pub link_type: LinkType,
}

/// Combines the pattern registry and the redirect resolver into a single
/// URL-to-[`ParseResult`] pipeline.
pub struct LinkNormalizer<F: RedirectFollower> {
    resolver: RedirectResolver<F>,
}

impl<F: RedirectFollower> LinkNormalizer<F> {
    /// Create a normalizer around a redirect resolver.
    pub fn new(resolver: RedirectResolver<F>) -> Self {
        Self { resolver }
    }

    /// Normalize one URL.
    ///
    /// Two phases: classify against the registry, then either extract the ID
    /// directly or delegate to the redirect resolver and re-extract from the
    /// canonical URL with the same rules. Every failure to produce an ID is
    /// logged and reported as `None`; exceptions are reserved for transport
    /// faults inside the resolver, which also collapse to `None` here.
    pub async fn normalize(&self, url: &str) -> Option<ParseResult> {
        let pattern = match classify(url) {
            Some(pattern) => pattern,
            None => {
                debug!(url, "no link pattern matched");
                return None;
            }
        };

        if pattern.link_type == LinkType::User {
            let sec_uid = capture_id(pattern, url)?;
            return Some(ParseResult {
                standard_url: canonical_user_url(&sec_uid),
                id: sec_uid,
                original_url: url.to_string(),
                link_type: LinkType::User,
            });
        }

        let id = if pattern.needs_redirect {
            match self.resolver.resolve(url).await {
                Ok(Some(canonical)) => Url::parse(&canonical)
                    .ok()
                    .as_ref()
                    .and_then(extract_video_id),
                Ok(None) => None,
                Err(error) => {
                    warn!(url, error = %error, "redirect resolution failed");
                    None
                }
            }
        } else {
            capture_id(pattern, url)
        };

        match id {
            Some(id) => Some(ParseResult {
                standard_url: canonical_video_url(&id),
                id,
                original_url: url.to_string(),
                link_type: LinkType::Video,
            }),
            None => {
                debug!(url, pattern = pattern.name, "could not extract an id");
                None
            }
        }
    }

    /// Normalize a batch of URLs with bounded concurrency.
    ///
    /// Unresolvable inputs surface in the outcome's error list as
    /// [`LinkError::Unresolvable`] so aggregate reporting can name exactly
    /// which inputs failed. The resolver owns the network retry budget, so
    /// callers should pass a no-retry batch policy to avoid multiplying it.
    pub async fn normalize_batch<P>(
        &self,
        urls: Vec<String>,
        options: &BatchOptions,
        on_progress: P,
    ) -> BatchOutcome<ParseResult, LinkError>
    where
        P: FnMut(usize, usize, usize),
    {
        process_batch(
            urls,
            |_, url: String| async move {
                self.normalize(&url)
                    .await
                    .ok_or_else(|| LinkError::Unresolvable(url.clone()))
            },
            options,
            on_progress,
        )
        .await
    }
}
