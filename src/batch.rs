//! Bounded-concurrency batch processing with per-item retry and error
//! aggregation.
//!
//! The defining property of this engine is partial-failure tolerance: a
//! worker's terminal failure (after its retry budget is exhausted) is captured
//! into the outcome's error list and never aborts sibling items or the batch
//! as a whole.

use crate::retry::{with_retry, RetryPolicy, Retryable};
use crate::shutdown::SharedShutdown;
use futures_util::stream::{self, StreamExt};
use std::fmt;
use std::future::Future;
use tracing::warn;

/// Options controlling batch execution.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Maximum number of items processed concurrently (minimum 1).
    pub concurrency: usize,
    /// Retry policy applied to each item individually.
    pub retry_policy: RetryPolicy,
    /// Optional shutdown handle; once triggered, unstarted items are cancelled.
    pub shutdown: Option<SharedShutdown>,
}

impl BatchOptions {
    /// Options with the given concurrency and the default retry policy.
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self {
            concurrency,
            retry_policy: RetryPolicy::default(),
            shutdown: crate::shutdown::get_global_shutdown(),
        }
    }

    /// Replace the per-item retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}

/// Terminal failure of a single batch item.
#[derive(Debug, thiserror::Error)]
pub enum BatchError<E: fmt::Display + fmt::Debug> {
    /// The worker failed after its retry budget was exhausted.
    #[error("{0}")]
    Failed(E),
    /// The item was never started because shutdown was requested.
    #[error("cancelled before start by shutdown request")]
    Cancelled,
}

/// A failed item together with its position in the input batch.
#[derive(Debug)]
pub struct BatchItemError<E: fmt::Display + fmt::Debug> {
    /// Index of the item in the input vector.
    pub index: usize,
    /// The terminal error.
    pub error: BatchError<E>,
}

/// Aggregate result of a batch run.
///
/// Every input item contributes exactly one entry:
/// `results.len() + errors.len() == input.len()`. Results appear in
/// completion order, not input order; callers needing input-order alignment
/// must use the index passed to the worker.
#[derive(Debug)]
pub struct BatchOutcome<R, E: fmt::Display + fmt::Debug> {
    /// Successful worker outputs, in completion order.
    pub results: Vec<R>,
    /// Terminal per-item failures, each tagged with its input index.
    pub errors: Vec<BatchItemError<E>>,
}

impl<R, E: fmt::Display + fmt::Debug> BatchOutcome<R, E> {
    /// Total number of items accounted for.
    pub fn total(&self) -> usize {
        self.results.len() + self.errors.len()
    }

    /// Whether every item completed successfully.
    pub fn is_fully_successful(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Process `items` with at most `options.concurrency` workers in flight.
///
/// Each invocation of `worker(index, item)` is individually wrapped in the
/// retry engine using the item's [`Retryable`] classification. `on_progress`
/// fires after every completion (success or terminal failure) with a
/// monotonically increasing completed count, the batch total, and the error
/// count so far.
pub async fn process_batch<T, R, E, W, Fut, P>(
    items: Vec<T>,
    worker: W,
    options: &BatchOptions,
    mut on_progress: P,
) -> BatchOutcome<R, E>
where
    T: Clone,
    E: Retryable + fmt::Display + fmt::Debug,
    W: Fn(usize, T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    P: FnMut(usize, usize, usize),
{
    let total = items.len();
    let worker = &worker;
    let policy = &options.retry_policy;
    let shutdown = options.shutdown.clone();

    let mut in_flight = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let shutdown = shutdown.clone();
            async move {
                if shutdown.as_ref().is_some_and(|s| s.is_shutdown_requested()) {
                    return (index, Err(BatchError::Cancelled));
                }
                let result = with_retry(
                    policy,
                    |error: &E| error.is_retryable(),
                    |error, attempt| {
                        warn!(index, attempt, error = %error, "batch item failed, will retry");
                    },
                    || worker(index, item.clone()),
                )
                .await;
                (index, result.map_err(BatchError::Failed))
            }
        })
        .buffer_unordered(options.concurrency.max(1));

    let mut outcome = BatchOutcome {
        results: Vec::new(),
        errors: Vec::new(),
    };
    let mut completed = 0usize;
    while let Some((index, result)) = in_flight.next().await {
        completed += 1;
        match result {
            Ok(value) => outcome.results.push(value),
            Err(error) => outcome.errors.push(BatchItemError { index, error }),
        }
        on_progress(completed, total, outcome.errors.len());
    }
    outcome
}
