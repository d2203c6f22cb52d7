//! Unit tests for the cursor-paginated listing engine.

use async_trait::async_trait;
use douyin_video_downloader::fetcher::{
    Cursor, FetchOptions, FetcherError, HasMore, PaginatedFetcher, PostItem, PostListResponse,
    PostPageSource,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn item(id: u64) -> PostItem {
    serde_json::from_value(serde_json::json!({
        "aweme_id": id.to_string(),
        "desc": format!("video {id}"),
        "video": { "play_addr": { "url_list": [format!("https://cdn.example/{id}.mp4")] } },
    }))
    .expect("valid post item json")
}

fn page(ids: std::ops::Range<u64>, cursor: i64, has_more: bool) -> PostListResponse {
    PostListResponse {
        status_code: 0,
        max_cursor: Some(Cursor::Int(cursor)),
        has_more: Some(HasMore(has_more)),
        aweme_list: Some(ids.map(item).collect()),
        total: None,
    }
}

/// Page source driven by a fixed script, indexed by call number.
struct ScriptedSource {
    pages: Vec<PostListResponse>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn new(pages: Vec<PostListResponse>) -> Self {
        Self {
            pages,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl PostPageSource for ScriptedSource {
    async fn fetch_page(
        &self,
        _user_id: &str,
        _cursor: &Cursor,
        _page_size: usize,
    ) -> Result<PostListResponse, FetcherError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(call) {
            Some(page) => Ok(clone_page(page)),
            None => Err(FetcherError::InvalidResponse("script exhausted".into())),
        }
    }
}

// PostListResponse is deliberately not Clone in the library; rebuild it here.
fn clone_page(page: &PostListResponse) -> PostListResponse {
    PostListResponse {
        status_code: page.status_code,
        max_cursor: page.max_cursor.clone(),
        has_more: page.has_more,
        aweme_list: page.aweme_list.clone(),
        total: page.total,
    }
}

fn fast_options() -> FetchOptions {
    FetchOptions {
        inter_page_delay: Duration::ZERO,
        ..FetchOptions::default()
    }
}

#[tokio::test]
async fn pages_accumulate_until_has_more_is_false() {
    let source = ScriptedSource::new(vec![
        page(0..20, 100, true),
        page(20..40, 200, true),
        page(40..50, 300, false),
    ]);
    let calls = source.calls.clone();
    let fetcher = PaginatedFetcher::new(source);

    let videos = fetcher
        .fetch_all("user", &fast_options(), |_, _| {})
        .await
        .unwrap();
    assert_eq!(videos.len(), 50);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(videos[0].id, "0");
    assert_eq!(videos[49].id, "49");
}

#[tokio::test]
async fn stale_cursor_stops_the_loop() {
    // Second page claims more data but repeats the first page's cursor.
    let source = ScriptedSource::new(vec![
        page(0..20, 100, true),
        page(20..40, 100, true),
        page(40..60, 100, true),
    ]);
    let calls = source.calls.clone();
    let fetcher = PaginatedFetcher::new(source);

    let videos = fetcher
        .fetch_all("user", &fast_options(), |_, _| {})
        .await
        .unwrap();
    // Page 1 advances the cursor from 0 to 100; page 2 fails to advance it.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(videos.len(), 40);
}

#[tokio::test]
async fn item_limit_truncates_to_exactly_the_limit() {
    let source = ScriptedSource::new(vec![page(0..20, 100, true), page(20..40, 200, true)]);
    let calls = source.calls.clone();
    let fetcher = PaginatedFetcher::new(source);

    let options = FetchOptions {
        item_limit: Some(5),
        ..fast_options()
    };
    let videos = fetcher.fetch_all("user", &options, |_, _| {}).await.unwrap();
    assert_eq!(videos.len(), 5);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "limit reached on the first page");
}

#[tokio::test]
async fn empty_page_ends_the_listing() {
    let source = ScriptedSource::new(vec![page(0..20, 100, true), page(20..20, 200, true)]);
    let fetcher = PaginatedFetcher::new(source);
    let videos = fetcher
        .fetch_all("user", &fast_options(), |_, _| {})
        .await
        .unwrap();
    assert_eq!(videos.len(), 20);
}

#[tokio::test]
async fn access_denied_keeps_partial_results() {
    struct DenyAfterOne {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PostPageSource for DenyAfterOne {
        async fn fetch_page(
            &self,
            _user_id: &str,
            _cursor: &Cursor,
            _page_size: usize,
        ) -> Result<PostListResponse, FetcherError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(page(0..20, 100, true))
            } else {
                Err(FetcherError::AccessDenied("403 Forbidden".into()))
            }
        }
    }

    let fetcher = PaginatedFetcher::new(DenyAfterOne {
        calls: AtomicUsize::new(0),
    });
    let videos = fetcher
        .fetch_all("user", &fast_options(), |_, _| {})
        .await
        .unwrap();
    assert_eq!(videos.len(), 20);
}

#[tokio::test]
async fn page_ceiling_bounds_a_runaway_listing() {
    struct EndlessSource {
        cursor: AtomicUsize,
    }

    #[async_trait]
    impl PostPageSource for EndlessSource {
        async fn fetch_page(
            &self,
            _user_id: &str,
            _cursor: &Cursor,
            _page_size: usize,
        ) -> Result<PostListResponse, FetcherError> {
            let n = self.cursor.fetch_add(1, Ordering::SeqCst) as i64;
            Ok(page(0..1, n + 1, true))
        }
    }

    let fetcher = PaginatedFetcher::new(EndlessSource {
        cursor: AtomicUsize::new(0),
    });
    let options = FetchOptions {
        max_pages: 7,
        ..fast_options()
    };
    let videos = fetcher.fetch_all("user", &options, |_, _| {}).await.unwrap();
    assert_eq!(videos.len(), 7);
}

#[tokio::test]
async fn progress_reports_the_running_count() {
    let source = ScriptedSource::new(vec![page(0..20, 100, true), page(20..30, 200, false)]);
    let fetcher = PaginatedFetcher::new(source);

    let mut reports = Vec::new();
    fetcher
        .fetch_all("user", &fast_options(), |fetched, _| reports.push(fetched))
        .await
        .unwrap();
    assert_eq!(reports, vec![20, 30]);
}
