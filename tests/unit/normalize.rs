//! Unit tests for link normalization over a scripted redirect follower.

use async_trait::async_trait;
use douyin_video_downloader::links::{
    LinkError, LinkNormalizer, LinkType, RedirectFollower, RedirectResolver,
};
use douyin_video_downloader::retry::RetryPolicy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

/// Follower that maps short URLs to scripted final URLs.
struct ScriptedFollower {
    routes: HashMap<String, String>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedFollower {
    fn new(routes: &[(&str, &str)]) -> Self {
        Self {
            routes: routes
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl RedirectFollower for ScriptedFollower {
    async fn final_url(&self, url: &str) -> Result<Url, LinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let target = self
            .routes
            .get(url)
            .ok_or_else(|| LinkError::Network(format!("no route for {url}")))?;
        Url::parse(target).map_err(|e| LinkError::InvalidUrl(e.to_string()))
    }
}

/// Follower that fails the test if normalization touches the network.
struct NoNetworkFollower;

#[async_trait]
impl RedirectFollower for NoNetworkFollower {
    async fn final_url(&self, url: &str) -> Result<Url, LinkError> {
        panic!("canonical link {url} must not be resolved over the network");
    }
}

fn normalizer<F: RedirectFollower>(follower: F) -> LinkNormalizer<F> {
    LinkNormalizer::new(RedirectResolver::new(follower, RetryPolicy::no_retries()))
}

#[tokio::test]
async fn canonical_links_are_a_fixed_point_without_network() {
    let n = normalizer(NoNetworkFollower);
    let url = "https://www.douyin.com/video/7300000000000000001";
    let result = n.normalize(url).await.unwrap();
    assert_eq!(result.id, "7300000000000000001");
    assert_eq!(result.standard_url, url);
    assert_eq!(result.link_type, LinkType::Video);

    // Normalizing the canonical output again yields the same record.
    let again = n.normalize(&result.standard_url).await.unwrap();
    assert_eq!(again.id, result.id);
    assert_eq!(again.standard_url, result.standard_url);
}

#[tokio::test]
async fn short_links_resolve_through_redirects() {
    let follower = ScriptedFollower::new(&[(
        "https://v.douyin.com/iAbCdEf/",
        "https://www.douyin.com/video/7300000000000000001?from=share",
    )]);
    let calls = follower.calls.clone();
    let n = normalizer(follower);

    let result = n.normalize("https://v.douyin.com/iAbCdEf/").await.unwrap();
    assert_eq!(result.id, "7300000000000000001");
    assert_eq!(result.standard_url, "https://www.douyin.com/video/7300000000000000001");
    assert_eq!(result.original_url, "https://v.douyin.com/iAbCdEf/");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn redirect_to_a_page_without_id_reports_failure() {
    let follower = ScriptedFollower::new(&[(
        "https://v.douyin.com/expired/",
        "https://www.douyin.com/home",
    )]);
    let n = normalizer(follower);
    assert!(n.normalize("https://v.douyin.com/expired/").await.is_none());
}

#[tokio::test]
async fn network_failure_during_resolution_reports_failure() {
    let n = normalizer(ScriptedFollower::new(&[]));
    assert!(n.normalize("https://v.douyin.com/abc/").await.is_none());
}

#[tokio::test]
async fn user_profile_links_normalize_without_network() {
    let n = normalizer(NoNetworkFollower);
    let result = n
        .normalize("https://www.douyin.com/user/MS4wLjABAAAA_example")
        .await
        .unwrap();
    assert_eq!(result.link_type, LinkType::User);
    assert_eq!(result.id, "MS4wLjABAAAA_example");
    assert_eq!(result.standard_url, "https://www.douyin.com/user/MS4wLjABAAAA_example");
}

#[tokio::test]
async fn different_share_shapes_converge_to_one_record() {
    let n = normalizer(ScriptedFollower::new(&[(
        "https://v.douyin.com/iAbCdEf/",
        "https://www.iesdouyin.com/share/video/555/?region=CN",
    )]));
    let from_short = n.normalize("https://v.douyin.com/iAbCdEf/").await.unwrap();
    let from_share = n
        .normalize("https://www.iesdouyin.com/share/video/555/")
        .await
        .unwrap();
    let from_query = n
        .normalize("https://www.douyin.com/discover?modal_id=555")
        .await
        .unwrap();
    assert_eq!(from_short.standard_url, from_share.standard_url);
    assert_eq!(from_share.standard_url, from_query.standard_url);
    assert_eq!(from_short.id, "555");
}
