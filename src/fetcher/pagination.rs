//! Cursor-based pagination over the user-post listing API.
//!
//! Pages are strictly sequential: each request's cursor comes from the prior
//! response, so page n+1 is never issued before page n resolves.
//!
//! Safety mechanisms:
//! - stale-cursor guard (a cursor that fails to advance ends the loop)
//! - page-count ceiling against runaway upstream pagination
//! - graceful termination on malformed or access-denied responses, keeping
//!   whatever was already accumulated

use crate::config::{DEFAULT_PAGE_SIZE, INTER_PAGE_DELAY, MAX_PAGES};
use crate::fetcher::http::{ApiHttpClient, POST_LIST_ENDPOINT};
use crate::fetcher::response::{Cursor, PostListResponse};
use crate::fetcher::{FetcherError, FetcherResult};
use crate::VideoInfo;
use async_trait::async_trait;
use metrics::counter;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Supplies one page of a user's posts.
///
/// The production implementation is [`HttpPostPageSource`]; tests script
/// page sequences without a network.
#[async_trait]
pub trait PostPageSource: Send + Sync {
    /// Fetch the page at `cursor` for the given user.
    async fn fetch_page(
        &self,
        user_id: &str,
        cursor: &Cursor,
        page_size: usize,
    ) -> FetcherResult<PostListResponse>;
}

/// Page source backed by the JSON API.
pub struct HttpPostPageSource {
    http: ApiHttpClient,
}

impl HttpPostPageSource {
    /// Create a page source over an API client.
    pub fn new(http: ApiHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PostPageSource for HttpPostPageSource {
    async fn fetch_page(
        &self,
        user_id: &str,
        cursor: &Cursor,
        page_size: usize,
    ) -> FetcherResult<PostListResponse> {
        let params = [
            ("sec_user_id", user_id.to_string()),
            ("max_cursor", cursor.as_param()),
            ("count", page_size.to_string()),
        ];
        self.http.get_json(POST_LIST_ENDPOINT, &params).await
    }
}

/// Options for a listing run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Stop after this many items, truncating to exactly the limit.
    pub item_limit: Option<usize>,
    /// Items requested per page.
    pub page_size: usize,
    /// Politeness delay between pages.
    pub inter_page_delay: Duration,
    /// Safety ceiling on the number of pages.
    pub max_pages: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            item_limit: None,
            page_size: DEFAULT_PAGE_SIZE,
            inter_page_delay: INTER_PAGE_DELAY,
            max_pages: MAX_PAGES,
        }
    }
}

/// Drives the cursor-paginated listing to completion.
pub struct PaginatedFetcher<S: PostPageSource> {
    source: S,
}

impl<S: PostPageSource> PaginatedFetcher<S> {
    /// Create a fetcher over a page source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch all of a user's posts, subject to the options' limits.
    ///
    /// Terminates when the API reports no more pages, returns an empty page,
    /// fails to advance the cursor, or when the item limit or page ceiling is
    /// reached. Malformed and access-denied responses end the run gracefully
    /// with the items accumulated so far; transport errors (already retried
    /// by the page source) propagate. `on_progress(fetched, estimated_total)`
    /// fires once per page.
    pub async fn fetch_all(
        &self,
        user_id: &str,
        options: &FetchOptions,
        mut on_progress: impl FnMut(usize, Option<u64>),
    ) -> FetcherResult<Vec<VideoInfo>> {
        let mut all = Vec::new();
        let mut cursor = Cursor::default();
        let mut pages_fetched = 0usize;

        loop {
            if pages_fetched >= options.max_pages {
                warn!(
                    user_id,
                    pages = pages_fetched,
                    "page ceiling reached, stopping listing"
                );
                break;
            }

            let response = match self
                .source
                .fetch_page(user_id, &cursor, options.page_size)
                .await
            {
                Ok(response) => response,
                Err(
                    error @ (FetcherError::AccessDenied(_)
                    | FetcherError::Parse(_)
                    | FetcherError::InvalidResponse(_)),
                ) => {
                    warn!(
                        user_id,
                        error = %error,
                        fetched = all.len(),
                        "listing terminated early, keeping partial results"
                    );
                    break;
                }
                Err(error) => return Err(error),
            };
            pages_fetched += 1;
            counter!("pages_fetched_total").increment(1);

            if response.status_code != 0 {
                warn!(
                    user_id,
                    status = response.status_code,
                    "listing API refused the request, stopping"
                );
                break;
            }

            let items = response.aweme_list.unwrap_or_default();
            if items.is_empty() {
                debug!(user_id, fetched = all.len(), "empty page, listing complete");
                break;
            }

            for item in items {
                match item.into_video_info() {
                    Ok(video) => all.push(video),
                    Err(error) => debug!(error = %error, "skipping malformed post item"),
                }
            }
            on_progress(all.len(), response.total);

            if let Some(limit) = options.item_limit {
                if all.len() >= limit {
                    all.truncate(limit);
                    info!(user_id, limit, "item limit reached");
                    break;
                }
            }

            if !response.has_more.map(|h| h.0).unwrap_or(false) {
                debug!(user_id, fetched = all.len(), "no more pages reported");
                break;
            }

            let next_cursor = response.max_cursor.unwrap_or_default();
            if next_cursor == cursor {
                warn!(
                    user_id,
                    cursor = %cursor,
                    "cursor did not advance, stopping to avoid a loop"
                );
                break;
            }
            cursor = next_cursor;

            tokio::time::sleep(options.inter_page_delay).await;
        }

        info!(
            user_id,
            total = all.len(),
            pages = pages_fetched,
            "listing finished"
        );
        Ok(all)
    }
}
