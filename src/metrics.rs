//! Observability metrics for the downloader.
//!
//! Built on the `metrics` crate with a Prometheus scrape endpoint. Counters
//! are emitted from the hot paths (HTTP retries, pages, downloads); this
//! module owns exporter setup and coarse per-job accounting.

use metrics::{counter, describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Install the Prometheus exporter and register metric descriptions.
///
/// Idempotent; call once at startup. Binds the scrape endpoint at `addr`.
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("metrics already initialized, skipping");
        return Ok(());
    }

    info!(%addr, "initializing metrics exporter");
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "http_retries_total",
        Unit::Count,
        "Total number of retried API requests"
    );
    describe_counter!(
        "pages_fetched_total",
        Unit::Count,
        "Total number of listing pages fetched"
    );
    describe_counter!(
        "videos_downloaded_total",
        Unit::Count,
        "Total number of videos downloaded to completion"
    );
    describe_counter!(
        "download_failures_total",
        Unit::Count,
        "Total number of videos that failed all download attempts"
    );
    describe_counter!(
        "download_bytes_total",
        Unit::Bytes,
        "Total bytes of video data written to disk"
    );
    describe_counter!(
        "jobs_completed_total",
        Unit::Count,
        "Total number of CLI jobs completed"
    );
    describe_counter!(
        "jobs_failed_total",
        Unit::Count,
        "Total number of CLI jobs that failed"
    );

    *initialized = true;
    info!(%addr, "metrics exporter ready");
    Ok(())
}

/// Whether the exporter has been installed.
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Coarse accounting for one CLI job.
pub struct JobMetrics {
    job_type: String,
    target: String,
    start_time: Instant,
}

impl JobMetrics {
    /// Start tracking a job.
    pub fn start(job_type: impl Into<String>, target: impl Into<String>) -> Self {
        let job_type = job_type.into();
        let target = target.into();
        info!(job_type = %job_type, target = %target, "job started");
        Self {
            job_type,
            target,
            start_time: Instant::now(),
        }
    }

    /// Record that the job completed, with the number of items it produced.
    pub fn record_success(&self, items_count: u64) {
        counter!(
            "jobs_completed_total",
            "job_type" => self.job_type.clone(),
        )
        .increment(1);
        info!(
            job_type = %self.job_type,
            target = %self.target,
            items_count,
            duration_secs = self.start_time.elapsed().as_secs(),
            "job completed"
        );
    }

    /// Record that the job failed.
    pub fn record_failure(&self, error: &str) {
        counter!(
            "jobs_failed_total",
            "job_type" => self.job_type.clone(),
        )
        .increment(1);
        error!(
            job_type = %self.job_type,
            target = %self.target,
            error = %error,
            duration_secs = self.start_time.elapsed().as_secs(),
            "job failed"
        );
    }
}
