//! Download command implementation.

use crate::batch::{BatchOptions, BatchOutcome};
use crate::browser::VideoDetailExtractor;
use crate::downloader::{DownloadEngine, DownloadResult, HttpMediaSource};
use crate::fetcher::ApiDetailExtractor;
use crate::links::{extract_links, LinkType, ParseResult};
use crate::metrics::JobMetrics;
use crate::retry::RetryPolicy;
use crate::shutdown::SharedShutdown;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

use super::CliError;

/// Maximum allowed concurrency to avoid self-inflicted rate limiting.
const MAX_CONCURRENCY: usize = 32;

/// Parse and validate the concurrency flag.
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Douyin Video Downloader CLI
#[derive(Parser, Debug)]
#[command(name = "douyin-video-downloader")]
#[command(about = "Download Douyin videos from share links and user profiles", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Cookie string forwarded verbatim with API requests
    #[arg(long, global = true, env = "DOUYIN_COOKIE")]
    pub cookie: Option<String>,

    /// Number of concurrent workers (default: 3, max: 32)
    #[arg(long, global = true, default_value = "3", value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Maximum number of retries for failed network operations (range: 0-20)
    #[arg(long, global = true, default_value = "3", value_parser = clap::value_parser!(u32).range(0..=20))]
    pub max_retries: u32,

    /// Prometheus metrics listen address (e.g. 127.0.0.1:9090); off when unset
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download videos from share text or links
    Download(DownloadArgs),

    /// Parse and normalize links without downloading
    Parse(super::ParseArgs),

    /// List or download a user's posted videos
    User(super::UserArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// Arguments for the download command.
#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Share text or URLs; links are extracted from anywhere in the text
    #[arg(value_name = "TEXT")]
    pub text: Vec<String>,

    /// File with share text, one or more links per line
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output directory for downloaded videos
    #[arg(long, default_value = "downloads")]
    pub output: PathBuf,

    /// Re-download files that already exist
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

/// One failed input, reported at the end without aborting its siblings.
#[derive(Debug, serde::Serialize)]
struct FailedInput {
    stage: &'static str,
    input: String,
    error: String,
}

impl DownloadArgs {
    /// Gather the raw input text from positional arguments and the input file.
    async fn gather_text(&self) -> Result<String, CliError> {
        let mut text = self.text.join(" ");
        if let Some(path) = &self.input {
            let contents = tokio::fs::read_to_string(path).await?;
            text.push('\n');
            text.push_str(&contents);
        }
        Ok(text)
    }

    /// Execute the download command.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let text = self.gather_text().await?;
        let urls = extract_links(&text);
        if urls.is_empty() {
            return Err(CliError::InvalidArgument(
                "no recognizable links found in input".to_string(),
            ));
        }
        let job = JobMetrics::start("download", format!("{} links", urls.len()));
        let mut failures: Vec<FailedInput> = Vec::new();

        // Phase 1: normalize. The resolver owns the retry budget.
        let normalizer = super::link_normalizer(cli)?;
        let options = BatchOptions {
            concurrency: cli.concurrency,
            retry_policy: RetryPolicy::no_retries(),
            shutdown: Some(shutdown.clone()),
        };
        let bar = super::batch_progress_bar(urls.len() as u64, "normalizing");
        let outcome = normalizer
            .normalize_batch(urls.clone(), &options, |completed, _, _| {
                bar.set_position(completed as u64);
            })
            .await;
        bar.finish_and_clear();

        for item in &outcome.errors {
            failures.push(FailedInput {
                stage: "normalize",
                input: urls.get(item.index).cloned().unwrap_or_default(),
                error: item.error.to_string(),
            });
        }
        let mut links: Vec<ParseResult> = Vec::new();
        for link in outcome.results {
            if link.link_type == LinkType::Video {
                links.push(link);
            } else {
                warn!(url = %link.original_url, "user profile link; use the `user` command");
                failures.push(FailedInput {
                    stage: "normalize",
                    input: link.original_url,
                    error: "user profile links are handled by the `user` command".to_string(),
                });
            }
        }

        // Phase 2: fetch detail for each video. The API client retries.
        let extractor = ApiDetailExtractor::new(super::api_client(cli)?);
        let bar = super::batch_progress_bar(links.len() as u64, "fetching details");
        let outcome = crate::batch::process_batch(
            links.clone(),
            |_, link: ParseResult| {
                let extractor = &extractor;
                async move { extractor.extract(&link).await }
            },
            &options,
            |completed, _, _| bar.set_position(completed as u64),
        )
        .await;
        bar.finish_and_clear();

        for item in &outcome.errors {
            failures.push(FailedInput {
                stage: "detail",
                input: links
                    .get(item.index)
                    .map(|l| l.original_url.clone())
                    .unwrap_or_default(),
                error: item.error.to_string(),
            });
        }
        let videos = outcome.results;

        // Phase 3: download. The engine owns retry and fallback chaining.
        let engine = DownloadEngine::new(HttpMediaSource::new()?)
            .with_retry_policy(super::retry_policy(cli))
            .with_overwrite(self.overwrite)
            .with_shutdown(Some(shutdown));
        let inputs: Vec<String> = videos.iter().map(|v| v.id.clone()).collect();
        let bar = super::batch_progress_bar(videos.len() as u64, "downloading");
        let outcome = engine
            .download_batch(videos, &self.output, cli.concurrency, |completed, _, _| {
                bar.set_position(completed as u64);
            })
            .await;
        bar.finish_and_clear();

        for item in &outcome.errors {
            failures.push(FailedInput {
                stage: "download",
                input: inputs.get(item.index).cloned().unwrap_or_default(),
                error: item.error.to_string(),
            });
        }

        report(cli.output_format, &urls, &outcome, &failures);
        if failures.is_empty() {
            job.record_success(outcome.results.len() as u64);
        } else {
            job.record_failure(&format!("{} of {} inputs failed", failures.len(), urls.len()));
        }
        Ok(())
    }
}

/// Print the aggregate report for a download run.
fn report(
    format: OutputFormat,
    inputs: &[String],
    outcome: &BatchOutcome<DownloadResult, crate::downloader::DownloadError>,
    failures: &[FailedInput],
) {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "inputs": inputs.len(),
                "downloaded": outcome.results.len(),
                "failed": failures.len(),
                "files": outcome
                    .results
                    .iter()
                    .filter_map(|r| r.file_path.as_ref())
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>(),
                "failures": failures,
            });
            println!("{}", serde_json::to_string(&output).unwrap_or_default());
        }
        OutputFormat::Human => {
            println!("\nDownload finished: {} of {} inputs succeeded", outcome.results.len(), inputs.len());
            for result in &outcome.results {
                if let Some(path) = &result.file_path {
                    println!("  {} -> {}", result.video_info.id, path.display());
                }
            }
            if !failures.is_empty() {
                eprintln!("\nFailed inputs:");
                for failure in failures {
                    eprintln!("  [{}] {}: {}", failure.stage, failure.input, failure.error);
                }
            }
        }
    }
    info!(
        downloaded = outcome.results.len(),
        failed = failures.len(),
        "download run complete"
    );
}
