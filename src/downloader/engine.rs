//! Streaming download engine with fallback URLs and partial-file cleanup.
//!
//! A download for one video walks an ordered chain of source URLs. Each URL
//! gets the full retry budget; only when a URL is exhausted (or fails
//! permanently) does the engine move to the next one. Any failed attempt
//! deletes the partially written file, so the destination either holds a
//! complete download or does not exist.

use crate::batch::{process_batch, BatchOptions, BatchOutcome};
use crate::config::{DEFAULT_USER_AGENT, HTTP_TIMEOUT};
use crate::downloader::progress::TransferProgress;
use crate::downloader::{DownloadError, DownloadResult};
use crate::retry::{RetryPolicy, Retryable};
use crate::shutdown::SharedShutdown;
use crate::VideoInfo;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use metrics::counter;
use reqwest::header::{RANGE, REFERER, USER_AGENT};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// An open byte stream for one media URL.
pub struct MediaStream {
    /// Total size reported by the server, when known.
    pub total_bytes: Option<u64>,
    /// The body chunks.
    pub chunks: Pin<Box<dyn Stream<Item = Result<Bytes, DownloadError>> + Send>>,
}

/// Opens a readable byte stream for a media URL.
///
/// The production implementation is [`HttpMediaSource`]; tests script chunk
/// sequences and failures without a network.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Open the stream at `url`.
    async fn open(&self, url: &str) -> Result<MediaStream, DownloadError>;
}

/// Media source backed by plain HTTP GET.
pub struct HttpMediaSource {
    client: Client,
    user_agent: String,
    referer: String,
}

impl HttpMediaSource {
    /// Build a source with its own transport.
    pub fn new() -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| DownloadError::Network(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    /// Build a source over a shared transport.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: "https://www.douyin.com/".to_string(),
        }
    }
}

#[async_trait]
impl MediaSource for HttpMediaSource {
    async fn open(&self, url: &str) -> Result<MediaStream, DownloadError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(REFERER, &self.referer)
            // CDN edges reject requests without a Range header more often.
            .header(RANGE, "bytes=0-")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DownloadError::Network(format!("timeout: {e}"))
                } else {
                    DownloadError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus(status.as_u16()));
        }

        let total_bytes = response.content_length();
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| DownloadError::Network(e.to_string())));
        Ok(MediaStream {
            total_bytes,
            chunks: Box::pin(chunks),
        })
    }
}

/// Derive the on-disk filename for a video: `{id}_{sanitized title}.mp4`, or
/// `{id}.mp4` when the title is empty after sanitization.
pub fn output_filename(video: &VideoInfo) -> String {
    let mut title: String = video
        .title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    title = title.trim().trim_matches('.').to_string();
    if title.chars().count() > 60 {
        title = title.chars().take(60).collect();
    }
    if title.is_empty() {
        format!("{}.mp4", video.id)
    } else {
        format!("{}_{}.mp4", video.id, title)
    }
}

/// Streams media files to disk.
pub struct DownloadEngine<S: MediaSource> {
    source: S,
    retry_policy: RetryPolicy,
    overwrite: bool,
    shutdown: Option<SharedShutdown>,
}

impl<S: MediaSource> DownloadEngine<S> {
    /// Create an engine with the default retry policy.
    pub fn new(source: S) -> Self {
        Self {
            source,
            retry_policy: RetryPolicy::default(),
            overwrite: false,
            shutdown: crate::shutdown::get_global_shutdown(),
        }
    }

    /// Replace the per-URL retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Re-download files that already exist at the destination.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Replace the shutdown handle.
    pub fn with_shutdown(mut self, shutdown: Option<SharedShutdown>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// The underlying media source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Download one video, walking `urls` in order until one succeeds.
    ///
    /// An existing destination file short-circuits as a cache hit unless
    /// overwrite is enabled. `on_progress(bytes_downloaded, total_bytes)`
    /// fires per received chunk. On failure the last URL's error is returned
    /// and no partial file remains at `dest`.
    pub async fn download_one(
        &self,
        urls: &[String],
        dest: &Path,
        mut on_progress: impl FnMut(u64, Option<u64>) + Send,
    ) -> Result<PathBuf, DownloadError> {
        if urls.is_empty() {
            return Err(DownloadError::NoSources);
        }
        if !self.overwrite && tokio::fs::try_exists(dest).await.unwrap_or(false) {
            debug!(dest = %dest.display(), "destination exists, skipping download");
            return Ok(dest.to_path_buf());
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::Io(e.to_string()))?;
        }

        let mut last_error = DownloadError::NoSources;
        for (position, url) in urls.iter().enumerate() {
            match self.download_with_retry(url, dest, &mut on_progress).await {
                Ok(path) => return Ok(path),
                Err(DownloadError::Cancelled) => return Err(DownloadError::Cancelled),
                Err(error) => {
                    if position + 1 < urls.len() {
                        warn!(
                            url = %url,
                            error = %error,
                            "source exhausted, falling back to next url"
                        );
                    }
                    last_error = error;
                }
            }
        }
        Err(last_error)
    }

    /// Retry a single URL with backoff. Every failed attempt deletes the
    /// partial file before the next attempt starts from byte zero.
    async fn download_with_retry<P>(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &mut P,
    ) -> Result<PathBuf, DownloadError>
    where
        P: FnMut(u64, Option<u64>) + Send,
    {
        let total_attempts = self.retry_policy.max_attempts.saturating_add(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.stream_to_file(url, dest, on_progress).await {
                Ok(path) => return Ok(path),
                Err(error) => {
                    cleanup_partial(dest).await;
                    if matches!(error, DownloadError::Cancelled) {
                        return Err(error);
                    }
                    if attempt >= total_attempts || !error.is_retryable() {
                        return Err(error);
                    }
                    let delay = self.retry_policy.delay_for_attempt(attempt);
                    warn!(
                        url = %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "download attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn stream_to_file<P>(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &mut P,
    ) -> Result<PathBuf, DownloadError>
    where
        P: FnMut(u64, Option<u64>) + Send,
    {
        let mut stream = self.source.open(url).await?;
        let mut file = File::create(dest)
            .await
            .map_err(|e| DownloadError::Io(e.to_string()))?;
        let mut progress = TransferProgress::new(stream.total_bytes);

        while let Some(chunk) = stream.chunks.next().await {
            if self
                .shutdown
                .as_ref()
                .is_some_and(|s| s.is_shutdown_requested())
            {
                return Err(DownloadError::Cancelled);
            }
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::Io(e.to_string()))?;
            progress.update(chunk.len() as u64);
            on_progress(progress.bytes_downloaded(), progress.total_bytes());
            if progress.should_emit() {
                info!(dest = %dest.display(), "{}", progress.format_progress());
                progress.mark_emitted();
            }
        }

        if let Some(total) = progress.total_bytes() {
            if progress.bytes_downloaded() < total {
                return Err(DownloadError::Network(format!(
                    "stream ended early: {} of {total} bytes",
                    progress.bytes_downloaded()
                )));
            }
        }
        file.flush()
            .await
            .map_err(|e| DownloadError::Io(e.to_string()))?;
        counter!("download_bytes_total").increment(progress.bytes_downloaded());
        Ok(dest.to_path_buf())
    }

    /// Download a batch of videos into `dir` with bounded concurrency.
    ///
    /// Each item's URL chain is the primary play URL followed by the CDN
    /// alternates, and the chain already owns the retry budget, so the batch
    /// pool runs without retries of its own. `on_progress(completed, total,
    /// failed)` fires after every item.
    pub async fn download_batch(
        &self,
        videos: Vec<VideoInfo>,
        dir: &Path,
        concurrency: usize,
        on_progress: impl FnMut(usize, usize, usize),
    ) -> BatchOutcome<DownloadResult, DownloadError> {
        let options = BatchOptions {
            concurrency,
            retry_policy: RetryPolicy::no_retries(),
            shutdown: self.shutdown.clone(),
        };
        let outcome = process_batch(
            videos,
            |_, video: VideoInfo| async move {
                let dest = dir.join(output_filename(&video));
                let chain = video.play_url_chain();
                match self.download_one(&chain, &dest, |_, _| {}).await {
                    Ok(path) => {
                        counter!("videos_downloaded_total").increment(1);
                        info!(id = %video.id, path = %path.display(), "video downloaded");
                        Ok(DownloadResult::completed(video, path))
                    }
                    Err(error) => {
                        counter!("download_failures_total").increment(1);
                        warn!(id = %video.id, error = %error, "video download failed");
                        Err(error)
                    }
                }
            },
            &options,
            on_progress,
        )
        .await;
        outcome
    }
}

/// Remove a partial file after a failed attempt. A missing file is fine;
/// other delete failures are logged and do not mask the original error.
async fn cleanup_partial(dest: &Path) {
    match tokio::fs::remove_file(dest).await {
        Ok(()) => debug!(dest = %dest.display(), "removed partial file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(dest = %dest.display(), error = %e, "failed to remove partial file"),
    }
}
