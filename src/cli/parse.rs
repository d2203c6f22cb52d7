//! Parse command: normalize links without downloading.

use crate::batch::BatchOptions;
use crate::links::extract_links;
use crate::retry::RetryPolicy;
use crate::shutdown::SharedShutdown;
use clap::Parser;
use std::path::PathBuf;

use super::{Cli, CliError, OutputFormat};

/// Arguments for the parse command.
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Share text or URLs; links are extracted from anywhere in the text
    #[arg(value_name = "TEXT")]
    pub text: Vec<String>,

    /// File with share text, one or more links per line
    #[arg(long)]
    pub input: Option<PathBuf>,
}

impl ParseArgs {
    /// Execute the parse command.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let mut text = self.text.join(" ");
        if let Some(path) = &self.input {
            let contents = tokio::fs::read_to_string(path).await?;
            text.push('\n');
            text.push_str(&contents);
        }

        let urls = extract_links(&text);
        if urls.is_empty() {
            return Err(CliError::InvalidArgument(
                "no recognizable links found in input".to_string(),
            ));
        }

        let normalizer = super::link_normalizer(cli)?;
        let options = BatchOptions {
            concurrency: cli.concurrency,
            retry_policy: RetryPolicy::no_retries(),
            shutdown: Some(shutdown),
        };
        let outcome = normalizer
            .normalize_batch(urls.clone(), &options, |_, _, _| {})
            .await;

        match cli.output_format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "inputs": urls.len(),
                    "parsed": outcome.results,
                    "failed": outcome
                        .errors
                        .iter()
                        .map(|e| urls.get(e.index).cloned().unwrap_or_default())
                        .collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
            }
            OutputFormat::Human => {
                for link in &outcome.results {
                    println!(
                        "{:>5}  {}  {}",
                        format!("{:?}", link.link_type).to_lowercase(),
                        link.id,
                        link.standard_url
                    );
                }
                for error in &outcome.errors {
                    eprintln!(
                        "failed  {}: {}",
                        urls.get(error.index).cloned().unwrap_or_default(),
                        error.error
                    );
                }
            }
        }
        Ok(())
    }
}
