//! # Democracy Signals
//!
//! Scans news feeds for early signals of democratic change and keeps a
//! growing, URL-deduplicated record of them.
//!
//! Every item is classified by a language model against a fixed taxonomy:
//! STRENGTHENS, NEW_DEMOCRACY, WEAKENS, COLLAPSE, or AMBIGUOUS. Only items the
//! model marks relevant are kept.
//!
//! ## Usage
//!
//! ```sh
//! ANTHROPIC_API_KEY=... democracy_signals -o signals.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Harvesting**: fetch and parse each configured RSS/Atom feed
//! 2. **Classification**: one model request per item
//! 3. **Filtering**: keep the relevant signals
//! 4. **Storage**: merge into the JSON database, first-seen URL wins

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod classifier;
mod cli;
mod config;
mod error;
mod harvester;
mod models;
mod pipeline;
mod prompt;
mod relevance;
mod store;
mod utils;

use api::{AnthropicClient, RetryAsk};
use cli::Cli;
use config::{Credential, ScannerConfig};
use harvester::HttpFeedFetcher;
use pipeline::Scanner;
use store::SignalStore;

const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("democracy_signals starting up");

    let args = Cli::parse();
    debug!(config = ?args.config, output = ?args.output, "Parsed CLI arguments");

    // Nothing touches the network without a credential.
    let credential = Credential::new(args.api_key.clone()).inspect_err(|e| {
        error!(error = %e, "Set ANTHROPIC_API_KEY or pass --api-key");
    })?;

    let mut config = ScannerConfig::load(args.config.as_deref()).await?;
    args.apply(&mut config);
    info!(
        feeds = config.feeds.len(),
        articles_per_feed = config.articles_per_feed,
        model = %config.model,
        output = %config.output_file.display(),
        "Configuration ready"
    );

    let fetcher = HttpFeedFetcher::new(&config)?;
    let api = RetryAsk::new(
        AnthropicClient::new(&config, credential)?,
        config.max_retries,
        RETRY_BASE_DELAY,
    );
    let store = SignalStore::new(&config.output_file);
    let scanner = Scanner::new(config, fetcher, api, store);

    let report = scanner.run().await.inspect_err(|e| {
        error!(error = %e, "Failed to write signal database");
    })?;
    info!(?report, "Scan finished");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
