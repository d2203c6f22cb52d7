//! Unit tests for the bounded-concurrency batch engine.

use douyin_video_downloader::batch::{process_batch, BatchError, BatchOptions};
use douyin_video_downloader::retry::{RetryPolicy, Retryable};
use douyin_video_downloader::shutdown::ShutdownCoordinator;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
enum TestError {
    #[error("transient failure")]
    Transient,
    #[error("permanent failure")]
    Permanent,
}

impl Retryable for TestError {
    fn is_retryable(&self) -> bool {
        matches!(self, TestError::Transient)
    }
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_factor: 2.0,
        jitter_ratio: 0.0,
    }
}

fn options(concurrency: usize, policy: RetryPolicy) -> BatchOptions {
    BatchOptions {
        concurrency,
        retry_policy: policy,
        shutdown: None,
    }
}

#[tokio::test]
async fn one_failure_does_not_abort_siblings() {
    let items: Vec<u32> = (0..10).collect();
    let outcome = process_batch(
        items,
        |_, n: u32| async move {
            if n == 3 {
                Err(TestError::Permanent)
            } else {
                Ok(n * 2)
            }
        },
        &options(4, RetryPolicy::no_retries()),
        |_, _, _| {},
    )
    .await;

    assert_eq!(outcome.results.len(), 9);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].index, 3);
    assert_eq!(outcome.total(), 10);
    assert!(!outcome.is_fully_successful());
}

#[tokio::test]
async fn concurrency_bound_is_respected() {
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let items: Vec<u32> = (0..12).collect();

    let outcome = process_batch(
        items,
        |_, _n: u32| {
            let current = current.clone();
            let peak = peak.clone();
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, TestError>(())
            }
        },
        &options(3, RetryPolicy::no_retries()),
        |_, _, _| {},
    )
    .await;

    assert!(outcome.is_fully_successful());
    assert!(peak.load(Ordering::SeqCst) <= 3, "peak {} workers in flight", peak.load(Ordering::SeqCst));
}

#[tokio::test]
async fn progress_counts_are_monotonic_and_complete() {
    let items: Vec<u32> = (0..8).collect();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = seen.clone();

    let outcome = process_batch(
        items,
        |_, n: u32| async move {
            if n % 2 == 0 {
                Ok(n)
            } else {
                Err(TestError::Permanent)
            }
        },
        &options(4, RetryPolicy::no_retries()),
        move |completed, total, failed| {
            seen_cb.lock().unwrap().push((completed, total, failed));
        },
    )
    .await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 8);
    for (i, (completed, total, _)) in seen.iter().enumerate() {
        assert_eq!(*completed, i + 1);
        assert_eq!(*total, 8);
    }
    assert_eq!(seen.last().unwrap().2, outcome.errors.len());
    assert_eq!(outcome.errors.len(), 4);
}

#[tokio::test]
async fn transient_failures_are_retried_permanent_are_not() {
    let attempts: Arc<Mutex<HashMap<usize, u32>>> = Arc::new(Mutex::new(HashMap::new()));
    let items: Vec<u32> = vec![0, 1, 2];

    let outcome = process_batch(
        items,
        |index, n: u32| {
            let attempts = attempts.clone();
            async move {
                let attempt = {
                    let mut map = attempts.lock().unwrap();
                    let entry = map.entry(index).or_insert(0);
                    *entry += 1;
                    *entry
                };
                match n {
                    // Succeeds on the second attempt.
                    0 if attempt < 2 => Err(TestError::Transient),
                    0 => Ok(n),
                    // Permanent: must fail on the first attempt.
                    1 => Err(TestError::Permanent),
                    _ => Ok(n),
                }
            }
        },
        &options(2, fast_policy(3)),
        |_, _, _| {},
    )
    .await;

    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].index, 1);

    let attempts = attempts.lock().unwrap();
    assert_eq!(attempts[&0], 2, "transient item retried once");
    assert_eq!(attempts[&1], 1, "permanent item not retried");
    assert_eq!(attempts[&2], 1);
}

#[tokio::test]
async fn shutdown_cancels_unstarted_items() {
    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    let outcome = process_batch(
        vec![1u32, 2, 3],
        |_, n: u32| async move { Ok::<_, TestError>(n) },
        &BatchOptions {
            concurrency: 2,
            retry_policy: RetryPolicy::no_retries(),
            shutdown: Some(shutdown),
        },
        |_, _, _| {},
    )
    .await;

    assert!(outcome.results.is_empty());
    assert_eq!(outcome.errors.len(), 3);
    for item in &outcome.errors {
        assert!(matches!(item.error, BatchError::Cancelled));
    }
}
