//! Shared configuration constants and documented defaults.

use std::time::Duration;

/// Default number of concurrent workers for batch operations.
/// 3 keeps request pressure low enough to stay under the platform's
/// anti-automation thresholds while still overlapping network waits.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Default number of retries per network operation (total attempts = retries + 1).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds.
/// 1 second is long enough for transient throttling to clear but short enough
/// to not overly delay recovery.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds.
/// 30 seconds caps exponential growth so a long retry chain stays bounded.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Exponential backoff multiplier applied per attempt.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Jitter ratio applied to computed backoff delays.
/// 0.3 spreads concurrent retries across a +/-15% window to avoid
/// synchronized retry storms.
pub const DEFAULT_JITTER_RATIO: f64 = 0.3;

/// Default page size for the user-post listing API.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Safety ceiling on pagination loops.
/// Guards against upstream pagination bugs that keep advancing the cursor
/// without ever reporting completion.
pub const MAX_PAGES: usize = 100;

/// Fixed delay between listing pages (politeness throttle).
pub const INTER_PAGE_DELAY: Duration = Duration::from_millis(800);

/// Request timeout for individual HTTP operations.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default browser-like user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
