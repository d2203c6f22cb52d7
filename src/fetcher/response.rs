//! Wire shapes for the listing and detail endpoints.
//!
//! The remote API is undocumented and loosely typed: cursors arrive as
//! numbers or strings, `has_more` arrives as a bool, a number, or a string
//! depending on endpoint version, and most fields are optional. Everything is
//! validated at this boundary before a domain [`VideoInfo`] is constructed;
//! nothing downstream touches a raw response shape.

use crate::fetcher::{FetcherError, FetcherResult};
use crate::links::patterns::canonical_user_url;
use crate::{VideoInfo, VideoStats};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque pagination token.
///
/// Compared structurally for the stale-cursor guard; the engine never
/// interprets its value beyond forwarding it to the next page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cursor {
    /// Numeric token (the common case).
    Int(i64),
    /// String token.
    Text(String),
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::Int(0)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Int(n) => write!(f, "{n}"),
            Cursor::Text(s) => write!(f, "{s}"),
        }
    }
}

impl Cursor {
    /// Render the token as a query-parameter value.
    pub fn as_param(&self) -> String {
        self.to_string()
    }
}

/// `has_more` flag with the platform's inconsistent encodings collapsed into
/// one coercion: bool as-is, numbers by `!= 0`, strings by `"1"`/`"true"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HasMore(pub bool);

impl<'de> Deserialize<'de> for HasMore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Num(i64),
            Text(String),
        }
        Ok(HasMore(match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => b,
            Raw::Num(n) => n != 0,
            Raw::Text(s) => matches!(s.trim(), "1" | "true" | "True"),
        }))
    }
}

/// One page of a user's posted videos.
#[derive(Debug, Default, Deserialize)]
pub struct PostListResponse {
    /// Platform status code; non-zero signals refusal (policy block, bad id).
    #[serde(default)]
    pub status_code: i64,
    /// Token for the next page.
    #[serde(default)]
    pub max_cursor: Option<Cursor>,
    /// Whether more pages exist.
    #[serde(default)]
    pub has_more: Option<HasMore>,
    /// The page's items.
    #[serde(default)]
    pub aweme_list: Option<Vec<PostItem>>,
    /// Total item count, when the endpoint reports one.
    #[serde(default)]
    pub total: Option<u64>,
}

/// Detail payload for a single video.
#[derive(Debug, Default, Deserialize)]
pub struct DetailResponse {
    /// Platform status code; non-zero signals refusal.
    #[serde(default)]
    pub status_code: i64,
    /// The video record.
    #[serde(default)]
    pub aweme_detail: Option<PostItem>,
}

/// Raw video record as the API ships it.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostItem {
    /// Video ID.
    pub aweme_id: Option<String>,
    /// Title / description text.
    pub desc: Option<String>,
    /// Publish time, Unix seconds.
    pub create_time: Option<i64>,
    /// Author block.
    pub author: Option<AuthorPayload>,
    /// Video block with play addresses.
    pub video: Option<VideoPayload>,
    /// Engagement counters.
    pub statistics: Option<StatisticsPayload>,
}

/// Raw author block.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthorPayload {
    /// Display name.
    pub nickname: Option<String>,
    /// Stable profile identifier.
    pub sec_uid: Option<String>,
}

/// Raw video block.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct VideoPayload {
    /// Playable addresses, ordered by decreasing priority.
    pub play_addr: Option<UrlList>,
    /// Cover image addresses.
    pub cover: Option<UrlList>,
}

/// A list of alternative URLs for the same asset.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UrlList {
    /// The alternatives; the first entry is the preferred one.
    #[serde(default)]
    pub url_list: Vec<String>,
}

/// Raw engagement counters.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StatisticsPayload {
    /// Like count.
    pub digg_count: Option<u64>,
    /// Comment count.
    pub comment_count: Option<u64>,
    /// Share count.
    pub share_count: Option<u64>,
    /// Play count.
    pub play_count: Option<u64>,
}

impl PostItem {
    /// Validate the loosely-typed payload into a domain record.
    ///
    /// An item without an ID or without at least one playable URL is
    /// rejected; everything else degrades to defaults.
    pub fn into_video_info(self) -> FetcherResult<VideoInfo> {
        let id = self
            .aweme_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| FetcherError::InvalidResponse("post item missing aweme_id".into()))?;

        let mut play_urls = self
            .video
            .as_ref()
            .and_then(|v| v.play_addr.as_ref())
            .map(|p| p.url_list.clone())
            .unwrap_or_default();
        play_urls.retain(|u| !u.is_empty());
        if play_urls.is_empty() {
            return Err(FetcherError::InvalidResponse(format!(
                "post {id} has no playable url"
            )));
        }
        let video_play_url = play_urls.remove(0);

        let author = self.author.unwrap_or_default();
        let user_name = author.nickname.unwrap_or_default();
        let user_url = author
            .sec_uid
            .as_deref()
            .map(canonical_user_url)
            .unwrap_or_default();

        let cover_url = self
            .video
            .and_then(|v| v.cover)
            .and_then(|c| c.url_list.into_iter().find(|u| !u.is_empty()));

        let stats = self.statistics.map(|s| VideoStats {
            likes: s.digg_count.unwrap_or(0),
            comments: s.comment_count.unwrap_or(0),
            shares: s.share_count.unwrap_or(0),
            plays: s.play_count.unwrap_or(0),
        });

        Ok(VideoInfo {
            id,
            title: self.desc.unwrap_or_default(),
            video_play_url,
            cdn_play_urls: play_urls,
            user_name,
            user_url,
            release_date: self
                .create_time
                .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0)),
            cover_url,
            stats,
        })
    }
}
