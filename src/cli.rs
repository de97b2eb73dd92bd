//! Command-line interface for the democracy signal scanner.
//!
//! Flags override values from the configuration file. Only the API key may
//! also come from the environment.

use crate::config::ScannerConfig;
use clap::Parser;
use std::path::PathBuf;

/// Scan news feeds for signals of democratic change and record them.
///
/// # Examples
///
/// ```sh
/// # Built-in feed list, results in ./signals.json
/// ANTHROPIC_API_KEY=... democracy_signals
///
/// # Own feed list, fewer items, four classifications in flight
/// democracy_signals -c feeds.yaml -n 5 --classify-concurrency 4
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a feeds/config YAML file (built-in list when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Signal database file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum number of items taken from each feed
    #[arg(short = 'n', long)]
    pub articles_per_feed: Option<usize>,

    /// Model identifier sent to the classification service
    #[arg(long)]
    pub model: Option<String>,

    /// Upper bound on tokens in each classification answer
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Classifications in flight at once
    #[arg(long)]
    pub classify_concurrency: Option<usize>,

    /// Feeds fetched at once
    #[arg(long)]
    pub harvest_concurrency: Option<usize>,

    /// Retries for transient classification failures (0 = single attempt)
    #[arg(long)]
    pub max_retries: Option<usize>,

    /// Timeout for each classification request, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl Cli {
    /// Write every flag that was given over the loaded configuration.
    pub fn apply(&self, config: &mut ScannerConfig) {
        if let Some(output) = &self.output {
            config.output_file = output.clone();
        }
        if let Some(n) = self.articles_per_feed {
            config.articles_per_feed = n;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(c) = self.classify_concurrency {
            config.classify_concurrency = c;
        }
        if let Some(c) = self.harvest_concurrency {
            config.harvest_concurrency = c;
        }
        if let Some(r) = self.max_retries {
            config.max_retries = r;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
    }
}
