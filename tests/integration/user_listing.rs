//! End-to-end user pipeline: paginated listing feeding the download engine,
//! all over scripted sources.

use async_trait::async_trait;
use bytes::Bytes;
use douyin_video_downloader::downloader::{DownloadEngine, DownloadError, MediaSource, MediaStream};
use douyin_video_downloader::fetcher::{
    Cursor, FetchOptions, FetcherError, PaginatedFetcher, PostListResponse, PostPageSource,
};
use douyin_video_downloader::retry::RetryPolicy;
use futures_util::stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct TwoPageSource {
    calls: AtomicUsize,
}

fn listing_page(json: serde_json::Value) -> PostListResponse {
    serde_json::from_value(json).expect("valid listing json")
}

#[async_trait]
impl PostPageSource for TwoPageSource {
    async fn fetch_page(
        &self,
        _user_id: &str,
        _cursor: &Cursor,
        _page_size: usize,
    ) -> Result<PostListResponse, FetcherError> {
        match self.calls.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(listing_page(serde_json::json!({
                "status_code": 0,
                "max_cursor": 1700000100,
                "has_more": "1",
                "aweme_list": [
                    {
                        "aweme_id": "101",
                        "desc": "first",
                        "create_time": 1700000000,
                        "author": { "nickname": "creator", "sec_uid": "MS4wLjABAAAA_uid" },
                        "video": { "play_addr": { "url_list": ["https://cdn.example/101.mp4"] } },
                    },
                    {
                        "aweme_id": "102",
                        "desc": "second",
                        "video": { "play_addr": { "url_list": ["https://cdn.example/102.mp4"] } },
                    },
                    // Malformed item: no playable URL, skipped without aborting.
                    { "aweme_id": "103", "desc": "broken" },
                ],
            }))),
            _ => Ok(listing_page(serde_json::json!({
                "status_code": 0,
                "max_cursor": 1700000200,
                "has_more": 0,
                "aweme_list": [
                    {
                        "aweme_id": "104",
                        "desc": "last",
                        "video": { "play_addr": { "url_list": ["https://cdn.example/104.mp4"] } },
                    },
                ],
            }))),
        }
    }
}

struct ByteSource;

#[async_trait]
impl MediaSource for ByteSource {
    async fn open(&self, url: &str) -> Result<MediaStream, DownloadError> {
        let body = Bytes::from(format!("video bytes for {url}"));
        let total = body.len() as u64;
        Ok(MediaStream {
            total_bytes: Some(total),
            chunks: Box::pin(stream::iter(vec![Ok(body)])),
        })
    }
}

#[tokio::test]
async fn listing_feeds_downloads_end_to_end() {
    let fetcher = PaginatedFetcher::new(TwoPageSource {
        calls: AtomicUsize::new(0),
    });
    let options = FetchOptions {
        inter_page_delay: Duration::ZERO,
        ..FetchOptions::default()
    };

    let videos = fetcher
        .fetch_all("MS4wLjABAAAA_uid", &options, |_, _| {})
        .await
        .unwrap();
    assert_eq!(videos.len(), 3, "malformed item is skipped");
    assert_eq!(videos[0].id, "101");
    assert_eq!(videos[0].user_name, "creator");
    assert_eq!(videos[0].user_url, "https://www.douyin.com/user/MS4wLjABAAAA_uid");
    assert!(videos[0].release_date.is_some());

    let dir = tempfile::tempdir().unwrap();
    let engine = DownloadEngine::new(ByteSource)
        .with_retry_policy(RetryPolicy::no_retries())
        .with_shutdown(None);
    let outcome = engine
        .download_batch(videos, dir.path(), 2, |_, _, _| {})
        .await;

    assert!(outcome.is_fully_successful());
    assert_eq!(outcome.results.len(), 3);
    assert!(dir.path().join("101_first.mp4").exists());
    assert!(dir.path().join("102_second.mp4").exists());
    assert!(dir.path().join("104_last.mp4").exists());
    let contents = std::fs::read_to_string(dir.path().join("101_first.mp4")).unwrap();
    assert_eq!(contents, "video bytes for https://cdn.example/101.mp4");
}

#[tokio::test]
async fn item_limit_is_honored_across_pages() {
    let fetcher = PaginatedFetcher::new(TwoPageSource {
        calls: AtomicUsize::new(0),
    });
    let options = FetchOptions {
        item_limit: Some(1),
        inter_page_delay: Duration::ZERO,
        ..FetchOptions::default()
    };
    let videos = fetcher
        .fetch_all("MS4wLjABAAAA_uid", &options, |_, _| {})
        .await
        .unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, "101");
}
