//! Video file download orchestration.
//!
//! [`engine::DownloadEngine`] streams a remote file to disk with per-chunk
//! progress, retries each source URL with exponential backoff, chains CDN
//! fallback URLs, and guarantees no partial file survives a failed attempt.

use crate::retry::Retryable;
use crate::VideoInfo;
use std::path::PathBuf;

pub mod engine;
pub mod progress;

pub use engine::{output_filename, DownloadEngine, HttpMediaSource, MediaSource, MediaStream};
pub use progress::TransferProgress;

/// Download errors.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Transport failure (timeout, reset, truncated body).
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status from a media URL.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Local filesystem failure.
    #[error("IO error: {0}")]
    Io(String),

    /// The caller supplied no source URLs at all.
    #[error("no source urls provided")]
    NoSources,

    /// Shutdown was requested mid-transfer.
    #[error("cancelled by shutdown request")]
    Cancelled,
}

impl Retryable for DownloadError {
    fn is_retryable(&self) -> bool {
        match self {
            DownloadError::Network(_) => true,
            DownloadError::HttpStatus(status) => matches!(status, 408 | 429) || *status >= 500,
            DownloadError::Io(_) | DownloadError::NoSources | DownloadError::Cancelled => false,
        }
    }
}

/// Per-item outcome of a batch download.
///
/// Exactly one of `file_path` (success) or `error` (failure) is populated;
/// the constructors enforce it.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// The video this outcome belongs to.
    pub video_info: VideoInfo,
    /// Destination path on success.
    pub file_path: Option<PathBuf>,
    /// Error message on failure.
    pub error: Option<String>,
}

impl DownloadResult {
    /// A completed download.
    pub fn completed(video_info: VideoInfo, file_path: PathBuf) -> Self {
        Self {
            video_info,
            file_path: Some(file_path),
            error: None,
        }
    }

    /// A terminally failed download.
    pub fn failed(video_info: VideoInfo, error: impl Into<String>) -> Self {
        Self {
            video_info,
            file_path: None,
            error: Some(error.into()),
        }
    }

    /// Whether the download succeeded.
    pub fn is_success(&self) -> bool {
        self.file_path.is_some()
    }
}
