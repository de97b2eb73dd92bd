//! Run orchestration: harvest → classify → filter → merge → persist.
//!
//! A run only fails when the database cannot be written. Feeds that fail are
//! skipped, items that fail become failure signals, and an unreadable
//! database starts empty. The database is written exactly once, after every
//! classification has finished.

use crate::api::AskAsync;
use crate::classifier::Classifier;
use crate::config::ScannerConfig;
use crate::error::StoreError;
use crate::harvester::{self, FeedFetcher};
use crate::models::{CandidateItem, Signal};
use crate::relevance::filter_relevant;
use crate::store::{self, SignalStore};
use crate::utils::truncate_for_log;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

/// Aggregate counts for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub feeds: usize,
    pub feeds_skipped: usize,
    pub articles_fetched: usize,
    pub classified_ok: usize,
    pub classification_failures: usize,
    pub relevant: usize,
    pub added: usize,
    pub total: usize,
}

/// Sequences one scan. Everything it needs is passed in at construction.
pub struct Scanner<F, A> {
    config: ScannerConfig,
    fetcher: F,
    classifier: Classifier<A>,
    store: SignalStore,
}

impl<F, A> Scanner<F, A>
where
    F: FeedFetcher,
    A: AskAsync,
{
    pub fn new(config: ScannerConfig, fetcher: F, api: A, store: SignalStore) -> Self {
        Self {
            config,
            fetcher,
            classifier: Classifier::new(api),
            store,
        }
    }

    #[instrument(level = "info", skip_all, fields(store = %self.store.path().display()))]
    pub async fn run(&self) -> Result<RunReport, StoreError> {
        let mut report = RunReport {
            feeds: self.config.feeds.len(),
            ..RunReport::default()
        };

        let harvest = harvester::harvest(
            &self.fetcher,
            &self.config.feeds,
            self.config.articles_per_feed,
            self.config.harvest_concurrency,
        )
        .await;
        report.feeds_skipped = harvest.skipped.len();
        report.articles_fetched = harvest.items.len();
        info!(
            articles = report.articles_fetched,
            skipped_feeds = report.feeds_skipped,
            "Articles fetched total"
        );

        let classified = self.classify_all(harvest.items).await;
        report.classification_failures = classified.iter().filter(|s| s.error().is_some()).count();
        report.classified_ok = classified.len() - report.classification_failures;

        let signals = filter_relevant(classified);
        report.relevant = signals.len();
        info!(
            relevant = report.relevant,
            articles = report.articles_fetched,
            failures = report.classification_failures,
            "Relevant signals identified"
        );

        let existing = self.store.load().await;
        let merged = store::merge(existing, signals)?;
        self.store.persist(&merged.signals).await?;
        report.added = merged.added;
        report.total = merged.total();

        info!(added = report.added, total = report.total, "New signals added to database");
        Ok(report)
    }

    /// Classify every item, one signal per item, in item order.
    ///
    /// Failures are folded into failure signals here so one bad item never
    /// stops the others.
    async fn classify_all(&self, items: Vec<CandidateItem>) -> Vec<Signal> {
        let total = items.len();
        stream::iter(items.into_iter().enumerate())
            .map(|(i, item)| async move {
                info!("[{}/{}] {}", i + 1, total, truncate_for_log(&item.title, 55));
                match self.classifier.classify(&item).await {
                    Ok(signal) => signal,
                    Err(e) => {
                        warn!(
                            url = %item.url,
                            title = %truncate_for_log(&item.title, 40),
                            error = %e,
                            "Classification failed"
                        );
                        let marker = e.signal_error();
                        Signal::failed(item, marker, Utc::now())
                    }
                }
            })
            .buffered(self.config.classify_concurrency.max(1))
            .collect()
            .await
    }
}
