//! User command: list or download a user's posted videos.

use crate::downloader::{DownloadEngine, HttpMediaSource};
use crate::fetcher::{FetchOptions, HttpPostPageSource, PaginatedFetcher};
use crate::links::LinkType;
use crate::metrics::JobMetrics;
use crate::shutdown::SharedShutdown;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use super::{Cli, CliError, OutputFormat};

/// Arguments for the user command.
#[derive(Parser, Debug)]
pub struct UserArgs {
    /// User profile URL (https://www.douyin.com/user/{sec_uid})
    #[arg(value_name = "URL")]
    pub url: String,

    /// Stop after this many videos
    #[arg(long)]
    pub limit: Option<usize>,

    /// Download the listed videos instead of only printing them
    #[arg(long, default_value_t = false)]
    pub download: bool,

    /// Output directory for downloaded videos
    #[arg(long, default_value = "downloads")]
    pub output: PathBuf,

    /// Re-download files that already exist
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

impl UserArgs {
    /// Execute the user command.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let normalizer = super::link_normalizer(cli)?;
        let link = normalizer.normalize(&self.url).await.ok_or_else(|| {
            CliError::InvalidArgument(format!("not a recognizable link: {}", self.url))
        })?;
        if link.link_type != LinkType::User {
            return Err(CliError::InvalidArgument(format!(
                "not a user profile link: {}",
                self.url
            )));
        }

        let job = JobMetrics::start("user", link.id.clone());
        let fetcher = PaginatedFetcher::new(HttpPostPageSource::new(super::api_client(cli)?));
        let options = FetchOptions {
            item_limit: self.limit,
            ..FetchOptions::default()
        };

        info!(user = %link.id, "listing user posts");
        let videos = match fetcher
            .fetch_all(&link.id, &options, |fetched, total| match total {
                Some(total) => info!(fetched, total, "listing progress"),
                None => info!(fetched, "listing progress"),
            })
            .await
        {
            Ok(videos) => videos,
            Err(error) => {
                job.record_failure(&error.to_string());
                return Err(error.into());
            }
        };

        match cli.output_format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&videos).unwrap_or_default());
            }
            OutputFormat::Human => {
                println!("{} videos by {}", videos.len(), link.standard_url);
                for video in &videos {
                    let date = video
                        .release_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    println!("  {}  {}  {}", video.id, date, video.title);
                }
            }
        }

        if self.download {
            let engine = DownloadEngine::new(HttpMediaSource::new()?)
                .with_retry_policy(super::retry_policy(cli))
                .with_overwrite(self.overwrite)
                .with_shutdown(Some(shutdown));
            let total = videos.len();
            let bar = super::batch_progress_bar(total as u64, "downloading");
            let outcome = engine
                .download_batch(videos, &self.output, cli.concurrency, |completed, _, _| {
                    bar.set_position(completed as u64);
                })
                .await;
            bar.finish_and_clear();
            println!(
                "Downloaded {} of {} videos to {}",
                outcome.results.len(),
                total,
                self.output.display()
            );
            for item in &outcome.errors {
                eprintln!("  failed item {}: {}", item.index, item.error);
            }
            job.record_success(outcome.results.len() as u64);
        } else {
            job.record_success(videos.len() as u64);
        }
        Ok(())
    }
}
