//! CLI command implementations.

pub mod download;
pub mod error;
pub mod parse;
pub mod user;

pub use download::{Cli, Commands, DownloadArgs, OutputFormat};
pub use error::CliError;
pub use parse::ParseArgs;
pub use user::UserArgs;

use crate::config::HTTP_TIMEOUT;
use crate::fetcher::http::API_BASE_URL;
use crate::fetcher::ApiHttpClient;
use crate::links::{HttpRedirectFollower, LinkNormalizer, RedirectResolver};
use crate::retry::RetryPolicy;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;

/// Retry policy derived from the global CLI flags.
fn retry_policy(cli: &Cli) -> RetryPolicy {
    RetryPolicy::default().with_max_attempts(cli.max_retries)
}

/// Shared HTTP transport with the default request timeout.
fn http_transport() -> Result<Client, CliError> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| CliError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// API client configured from the global CLI flags.
fn api_client(cli: &Cli) -> Result<ApiHttpClient, CliError> {
    Ok(
        ApiHttpClient::new(http_transport()?, API_BASE_URL, retry_policy(cli))
            .with_cookie(cli.cookie.clone()),
    )
}

/// Link normalizer with a live redirect follower.
fn link_normalizer(cli: &Cli) -> Result<LinkNormalizer<HttpRedirectFollower>, CliError> {
    let follower = HttpRedirectFollower::new(
        http_transport()?,
        crate::config::DEFAULT_USER_AGENT.to_string(),
    );
    Ok(LinkNormalizer::new(RedirectResolver::new(
        follower,
        retry_policy(cli),
    )))
}

/// Progress bar for a batch of known size.
fn batch_progress_bar(len: u64, label: &str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    bar.set_message(label.to_string());
    bar
}
