//! End-to-end link pipeline: extract from share text, normalize in a batch,
//! and report failures per input.

use async_trait::async_trait;
use douyin_video_downloader::batch::BatchOptions;
use douyin_video_downloader::links::{
    extract_links, LinkError, LinkNormalizer, RedirectFollower, RedirectResolver,
};
use douyin_video_downloader::retry::RetryPolicy;
use std::collections::HashMap;
use url::Url;

struct ScriptedFollower {
    routes: HashMap<String, String>,
}

#[async_trait]
impl RedirectFollower for ScriptedFollower {
    async fn final_url(&self, url: &str) -> Result<Url, LinkError> {
        let target = self
            .routes
            .get(url)
            .ok_or_else(|| LinkError::Network(format!("no route for {url}")))?;
        Url::parse(target).map_err(|e| LinkError::InvalidUrl(e.to_string()))
    }
}

#[tokio::test]
async fn share_text_flows_to_canonical_records() {
    let text = "\
        Check this out! https://v.douyin.com/iAbCdEf/ #fyp\n\
        direct: https://www.douyin.com/video/7300000000000000001\n\
        dead short link https://v.douyin.com/dead00/\n\
        duplicate https://www.douyin.com/video/7300000000000000001 again";

    let urls = extract_links(text);
    assert_eq!(urls.len(), 3, "duplicates collapse, order preserved");

    let follower = ScriptedFollower {
        routes: [(
            "https://v.douyin.com/iAbCdEf/".to_string(),
            "https://www.douyin.com/video/7300000000000000002?from=share".to_string(),
        )]
        .into_iter()
        .collect(),
    };
    let normalizer = LinkNormalizer::new(RedirectResolver::new(follower, RetryPolicy::no_retries()));

    let options = BatchOptions {
        concurrency: 2,
        retry_policy: RetryPolicy::no_retries(),
        shutdown: None,
    };
    let outcome = normalizer
        .normalize_batch(urls.clone(), &options, |_, _, _| {})
        .await;

    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.errors.len(), 1);

    let mut ids: Vec<&str> = outcome.results.iter().map(|r| r.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["7300000000000000001", "7300000000000000002"]);
    for result in &outcome.results {
        assert_eq!(
            result.standard_url,
            format!("https://www.douyin.com/video/{}", result.id)
        );
    }

    // The failed entry names exactly the dead short link.
    let failed = &outcome.errors[0];
    assert_eq!(urls[failed.index], "https://v.douyin.com/dead00/");
    assert!(matches!(failed.error, douyin_video_downloader::batch::BatchError::Failed(LinkError::Unresolvable(_))));
}

#[tokio::test]
async fn batch_progress_covers_every_input() {
    let normalizer = LinkNormalizer::new(RedirectResolver::new(
        ScriptedFollower {
            routes: HashMap::new(),
        },
        RetryPolicy::no_retries(),
    ));
    let urls = vec![
        "https://www.douyin.com/video/1".to_string(),
        "https://www.douyin.com/video/2".to_string(),
        "https://example.com/not-douyin".to_string(),
    ];

    let mut last = (0, 0, 0);
    let outcome = normalizer
        .normalize_batch(
            urls,
            &BatchOptions {
                concurrency: 3,
                retry_policy: RetryPolicy::no_retries(),
                shutdown: None,
            },
            |completed, total, failed| last = (completed, total, failed),
        )
        .await;

    assert_eq!(last, (3, 3, 1));
    assert_eq!(outcome.total(), 3);
}
