//! Douyin video downloader core.
//!
//! Turns messy share text into downloaded video files in four stages:
//!
//! 1. **Links** ([`links`]): extract candidate URLs from free-form text,
//!    resolve short links through their redirects, and normalize everything
//!    into canonical video/user URLs with stable IDs.
//! 2. **Fetch** ([`fetcher`]): query the platform's JSON API for a single
//!    video's detail or a user's full posting history (cursor-paginated).
//! 3. **Download** ([`downloader`]): stream media to disk with retry,
//!    fallback URL chaining, and partial-file cleanup.
//! 4. **Batch** ([`batch`]): run any of the above over many items with
//!    bounded concurrency and partial-failure tolerance.
//!
//! Network seams ([`links::RedirectFollower`], [`fetcher::PostPageSource`],
//! [`downloader::MediaSource`], [`browser::PageHandle`]) are traits so every
//! stage is testable without touching the platform.

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod batch;
pub mod browser;
pub mod cli;
pub mod config;
pub mod downloader;
pub mod fetcher;
pub mod links;
pub mod metrics;
pub mod retry;
pub mod shutdown;

pub use batch::{process_batch, BatchOptions, BatchOutcome};
pub use retry::{with_retry, RetryPolicy, Retryable};
pub use shutdown::{ShutdownCoordinator, SharedShutdown};

/// Engagement counters for a video.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VideoStats {
    /// Like count.
    pub likes: u64,
    /// Comment count.
    pub comments: u64,
    /// Share count.
    pub shares: u64,
    /// Play count.
    pub plays: u64,
}

/// A validated video record, the currency between fetching and downloading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Platform-assigned numeric video ID.
    pub id: String,
    /// Title / description text; may be empty.
    pub title: String,
    /// Preferred playable URL.
    pub video_play_url: String,
    /// Fallback CDN URLs for the same media, in priority order.
    #[serde(default)]
    pub cdn_play_urls: Vec<String>,
    /// Author display name.
    pub user_name: String,
    /// Canonical author profile URL.
    pub user_url: String,
    /// Publish time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    /// Cover image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Engagement counters, when the API reported them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<VideoStats>,
}

impl VideoInfo {
    /// The full ordered URL chain for downloading: the preferred URL followed
    /// by the CDN fallbacks.
    pub fn play_url_chain(&self) -> Vec<String> {
        let mut chain = Vec::with_capacity(1 + self.cdn_play_urls.len());
        chain.push(self.video_play_url.clone());
        chain.extend(self.cdn_play_urls.iter().cloned());
        chain
    }
}
