//! Ordered registry of URL-shape matchers.
//!
//! Patterns are tried in a fixed priority order and the first structural
//! match wins. The order is part of the contract: a canonical `/video/{id}`
//! URL must never be misclassified as a generic query-parameter form.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What kind of resource a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// A single video (or note) post.
    Video,
    /// A user profile page.
    User,
    /// Matched a known domain but no recognizable resource shape.
    Unknown,
}

/// One URL-shape matcher with its dispatch metadata.
pub struct LinkPattern {
    /// Stable name used in logs and tests.
    pub name: &'static str,
    /// The shape matcher. Capture group 1, when present, is the resource ID.
    pub regex: Regex,
    /// Whether the ID can only be obtained by following HTTP redirects.
    pub needs_redirect: bool,
    /// Resource kind this shape refers to.
    pub link_type: LinkType,
}

/// The registry, in priority order. Immutable, built on first use.
pub static LINK_PATTERNS: Lazy<Vec<LinkPattern>> = Lazy::new(|| {
    vec![
        LinkPattern {
            name: "video-path",
            regex: Regex::new(r"https?://(?:www\.)?douyin\.com/video/(\d+)").unwrap(),
            needs_redirect: false,
            link_type: LinkType::Video,
        },
        LinkPattern {
            name: "short-link",
            regex: Regex::new(r"https?://v\.douyin\.com/[A-Za-z0-9_-]+/?").unwrap(),
            needs_redirect: true,
            link_type: LinkType::Video,
        },
        LinkPattern {
            name: "share-path",
            regex: Regex::new(r"https?://(?:www\.)?iesdouyin\.com/share/video/(\d+)").unwrap(),
            needs_redirect: false,
            link_type: LinkType::Video,
        },
        LinkPattern {
            name: "note-path",
            regex: Regex::new(r"https?://(?:www\.)?douyin\.com/note/(\d+)").unwrap(),
            needs_redirect: false,
            link_type: LinkType::Video,
        },
        LinkPattern {
            name: "discover-query",
            regex: Regex::new(r#"https?://(?:www\.)?douyin\.com/discover\?[^\s"'<>]*modal_id=(\d+)"#)
                .unwrap(),
            needs_redirect: false,
            link_type: LinkType::Video,
        },
        LinkPattern {
            name: "query-param",
            regex: Regex::new(
                r#"https?://[A-Za-z0-9.-]*douyin\.com/[^\s"'<>]*(?:vid|video_id|modal_id)=(\d+)"#,
            )
            .unwrap(),
            needs_redirect: false,
            link_type: LinkType::Video,
        },
        LinkPattern {
            name: "user-profile",
            regex: Regex::new(r"https?://(?:www\.)?douyin\.com/user/([A-Za-z0-9_-]+)").unwrap(),
            needs_redirect: false,
            link_type: LinkType::User,
        },
    ]
});

/// Classify a URL against the registry. First match in priority order wins.
pub fn classify(url: &str) -> Option<&'static LinkPattern> {
    LINK_PATTERNS.iter().find(|pattern| pattern.regex.is_match(url))
}

/// Extract the resource ID captured by a pattern, if the pattern carries one.
///
/// Short-link shapes have no capture group; their ID only exists behind the
/// redirect.
pub fn capture_id(pattern: &LinkPattern, url: &str) -> Option<String> {
    pattern
        .regex
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Canonical video URL, deterministically derived from the ID.
pub fn canonical_video_url(id: &str) -> String {
    format!("https://www.douyin.com/video/{id}")
}

/// Canonical user-profile URL, deterministically derived from the sec-uid.
pub fn canonical_user_url(sec_uid: &str) -> String {
    format!("https://www.douyin.com/user/{sec_uid}")
}
