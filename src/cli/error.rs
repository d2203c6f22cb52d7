//! CLI error types and conversions.

use crate::browser::ExtractError;
use crate::downloader::DownloadError;
use crate::fetcher::FetcherError;
use crate::links::LinkError;

/// CLI errors.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Link error
    #[error("link error: {0}")]
    Link(#[from] LinkError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// Extraction error
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Download error
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}
