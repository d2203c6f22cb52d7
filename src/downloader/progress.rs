//! Transfer progress tracking for streaming downloads.

use std::time::{Duration, Instant};

/// Tracks bytes transferred for a single download and rate-limits how often
/// progress is emitted to logs.
#[derive(Debug)]
pub struct TransferProgress {
    bytes_downloaded: u64,
    total_bytes: Option<u64>,
    started_at: Instant,
    last_emit: Instant,
    emit_interval: Duration,
}

impl TransferProgress {
    /// Start tracking a transfer with an optional known size.
    pub fn new(total_bytes: Option<u64>) -> Self {
        let now = Instant::now();
        Self {
            bytes_downloaded: 0,
            total_bytes,
            started_at: now,
            last_emit: now,
            emit_interval: Duration::from_secs(2),
        }
    }

    /// Record that `n` more bytes arrived.
    pub fn update(&mut self, n: u64) {
        self.bytes_downloaded += n;
    }

    /// Bytes transferred so far.
    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded
    }

    /// Expected total, when the server reported one.
    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    /// Whether enough time has passed since the last emitted update.
    pub fn should_emit(&self) -> bool {
        self.last_emit.elapsed() >= self.emit_interval
    }

    /// Reset the emission timer after logging an update.
    pub fn mark_emitted(&mut self) {
        self.last_emit = Instant::now();
    }

    /// Completion percentage, when the total is known.
    pub fn percentage(&self) -> Option<f64> {
        self.total_bytes.filter(|t| *t > 0).map(|total| {
            (self.bytes_downloaded as f64 / total as f64 * 100.0).min(100.0)
        })
    }

    /// Average transfer rate in bytes per second.
    pub fn rate(&self) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.bytes_downloaded as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Human-readable progress line for log output.
    pub fn format_progress(&self) -> String {
        match self.percentage() {
            Some(pct) => format!(
                "{} / {} ({pct:.1}%) at {}/s",
                format_bytes(self.bytes_downloaded),
                format_bytes(self.total_bytes.unwrap_or(0)),
                format_bytes(self.rate() as u64),
            ),
            None => format!(
                "{} at {}/s",
                format_bytes(self.bytes_downloaded),
                format_bytes(self.rate() as u64),
            ),
        }
    }
}

/// Format a byte count with a binary-unit suffix.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
