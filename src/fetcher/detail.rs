//! Detail extraction over the JSON API.
//!
//! The default [`VideoDetailExtractor`] implementation: one request to the
//! detail endpoint per normalized link, validated into a [`VideoInfo`] at the
//! response boundary. A browser-backed extractor (see [`crate::browser`])
//! slots into the same trait when the API path is blocked.

use crate::browser::{ExtractError, VideoDetailExtractor};
use crate::fetcher::http::{ApiHttpClient, DETAIL_ENDPOINT};
use crate::fetcher::response::DetailResponse;
use crate::links::{LinkType, ParseResult};
use crate::VideoInfo;
use async_trait::async_trait;
use tracing::debug;

/// Detail extractor backed by the platform's JSON detail endpoint.
pub struct ApiDetailExtractor {
    http: ApiHttpClient,
}

impl ApiDetailExtractor {
    /// Create an extractor over an API client.
    pub fn new(http: ApiHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl VideoDetailExtractor for ApiDetailExtractor {
    async fn extract(&self, link: &ParseResult) -> Result<VideoInfo, ExtractError> {
        if link.link_type != LinkType::Video {
            return Err(ExtractError::InvalidPayload(format!(
                "not a video link: {}",
                link.original_url
            )));
        }

        debug!(id = %link.id, "fetching video detail");
        let params = [("aweme_id", link.id.clone())];
        let response: DetailResponse = self.http.get_json(DETAIL_ENDPOINT, &params).await?;

        if response.status_code != 0 {
            return Err(ExtractError::InvalidPayload(format!(
                "detail API refused request for {}: status {}",
                link.id, response.status_code
            )));
        }
        let item = response.aweme_detail.ok_or_else(|| {
            ExtractError::InvalidPayload(format!("detail response for {} is empty", link.id))
        })?;
        item.into_video_info()
            .map_err(|e| ExtractError::InvalidPayload(e.to_string()))
    }
}
