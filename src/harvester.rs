//! Feed harvesting: download each configured feed and normalize its entries.
//!
//! Every feed is handled independently. A feed whose URL is malformed, or
//! that cannot be downloaded or parsed, is logged, recorded in [`Harvest::skipped`] and contributes no
//! items; the other feeds are unaffected.
//!
//! # Normalization
//!
//! | Item field  | Taken from                                   |
//! |-------------|----------------------------------------------|
//! | `title`     | entry title, trimmed                         |
//! | `summary`   | entry summary (or content body), first 800 chars, trimmed |
//! | `url`       | first entry link                             |
//! | `published` | publication date (else last update) as RFC 3339 |
//!
//! Missing values become empty strings. So do dates feed-rs cannot parse.

use crate::config::{FeedSource, ScannerConfig};
use crate::error::HarvestError;
use crate::models::CandidateItem;
use crate::utils::truncate_chars;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Maximum number of summary characters kept per item.
pub const SUMMARY_MAX_CHARS: usize = 800;

/// Source of raw feed documents.
///
/// The HTTP implementation is [`HttpFeedFetcher`]; tests substitute
/// in-memory documents.
pub trait FeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, HarvestError>;
}

/// Fetches feeds over HTTP GET without authentication.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
    timeout_secs: u64,
}

impl HttpFeedFetcher {
    pub fn new(config: &ScannerConfig) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.feed_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            timeout_secs: config.feed_timeout_secs,
        })
    }
}

impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, HarvestError> {
        let response = self.client.get(url).send().await.map_err(|e| self.map_error(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        Ok(body.to_vec())
    }
}

impl HttpFeedFetcher {
    fn map_error(&self, e: reqwest::Error) -> HarvestError {
        if e.is_timeout() {
            HarvestError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            HarvestError::Http(e)
        }
    }
}

/// The items gathered from all feeds in one run.
#[derive(Debug, Default)]
pub struct Harvest {
    /// Items in feed order, each feed's entries in their native order.
    pub items: Vec<CandidateItem>,
    /// Names of the feeds that contributed nothing because they failed.
    pub skipped: Vec<String>,
}

/// Harvest up to `per_feed` items from every feed.
///
/// Up to `concurrency` feeds are downloaded at once; results are buffered in
/// order so the output never depends on which download finishes first.
#[instrument(level = "info", skip(fetcher, feeds), fields(feeds = feeds.len()))]
pub async fn harvest<F: FeedFetcher>(
    fetcher: &F,
    feeds: &[FeedSource],
    per_feed: usize,
    concurrency: usize,
) -> Harvest {
    if feeds.is_empty() {
        warn!("No feeds configured; nothing to harvest");
    }
    let results: Vec<(&FeedSource, Result<Vec<CandidateItem>, HarvestError>)> =
        stream::iter(feeds)
            .map(|feed| async move { (feed, harvest_feed(fetcher, feed, per_feed).await) })
            .buffered(concurrency.max(1))
            .collect()
            .await;

    let mut harvest = Harvest::default();
    for (feed, result) in results {
        match result {
            Ok(items) => {
                info!(source = %feed.name, count = items.len(), "Harvested feed");
                harvest.items.extend(items);
            }
            Err(e) => {
                warn!(source = %feed.name, url = %feed.url, error = %e, "Skipping feed");
                harvest.skipped.push(feed.name.clone());
            }
        }
    }
    harvest
}

async fn harvest_feed<F: FeedFetcher>(
    fetcher: &F,
    feed: &FeedSource,
    per_feed: usize,
) -> Result<Vec<CandidateItem>, HarvestError> {
    Url::parse(&feed.url)?;
    let body = fetcher.fetch(&feed.url).await?;
    debug!(source = %feed.name, bytes = body.len(), "Fetched feed document");
    parse_items(&feed.name, &body, per_feed)
}

/// Parse a feed document into at most `per_feed` candidate items.
pub fn parse_items(
    source: &str,
    body: &[u8],
    per_feed: usize,
) -> Result<Vec<CandidateItem>, HarvestError> {
    let feed = feed_rs::parser::parse(body)?;
    Ok(feed
        .entries
        .into_iter()
        .take(per_feed)
        .map(|entry| normalize_entry(source, entry))
        .collect())
}

fn normalize_entry(source: &str, entry: feed_rs::model::Entry) -> CandidateItem {
    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();
    let summary = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();
    let url = entry
        .links
        .into_iter()
        .next()
        .map(|link| link.href)
        .unwrap_or_default();
    let published = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();

    CandidateItem {
        source: source.to_string(),
        title,
        summary: truncate_chars(&summary, SUMMARY_MAX_CHARS).trim().to_string(),
        url,
        published,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn rss(items: &[(&str, &str)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, link)| {
                format!(
                    "<item><title>{title}</title><link>{link}</link>\
                     <description>About {title}</description>\
                     <pubDate>Tue, 06 May 2025 12:00:00 GMT</pubDate></item>"
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test</title><link>https://example.com</link>
<description>Test feed</description>{body}</channel></rss>"#
        )
    }

    /// Serves fixed documents per URL, with optional per-URL delays.
    #[derive(Default)]
    pub(crate) struct StaticFetcher {
        pub(crate) docs: HashMap<String, String>,
        pub(crate) timeouts: Vec<String>,
        pub(crate) delays_ms: HashMap<String, u64>,
    }

    impl StaticFetcher {
        pub(crate) fn with(mut self, url: &str, doc: String) -> Self {
            self.docs.insert(url.to_string(), doc);
            self
        }

        pub(crate) fn timing_out(mut self, url: &str) -> Self {
            self.timeouts.push(url.to_string());
            self
        }
    }

    impl FeedFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, HarvestError> {
            if let Some(ms) = self.delays_ms.get(url) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            if self.timeouts.iter().any(|u| u == url) {
                return Err(HarvestError::Timeout { secs: 30 });
            }
            self.docs
                .get(url)
                .map(|doc| doc.clone().into_bytes())
                .ok_or(HarvestError::Status { status: 404 })
        }
    }

    #[test]
    fn test_parse_rss_items_in_feed_order() {
        let doc = rss(&[("First", "https://x/1"), ("Second", "https://x/2")]);
        let items = parse_items("yle", doc.as_bytes(), 20).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, "yle");
        assert_eq!(items[0].title, "First");
        assert_eq!(items[0].url, "https://x/1");
        assert_eq!(items[0].summary, "About First");
        assert!(items[0].published.starts_with("2025-05-06T12:00:00"));
        assert_eq!(items[1].url, "https://x/2");
    }

    #[test]
    fn test_parse_caps_items_per_feed() {
        let doc = rss(&[("a", "https://x/a"), ("b", "https://x/b"), ("c", "https://x/c")]);
        let items = parse_items("feed", doc.as_bytes(), 2).unwrap();
        let urls: Vec<_> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, ["https://x/a", "https://x/b"]);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let doc = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title><link>https://example.com</link><description>d</description>
<item><guid isPermaLink="false">only-a-guid</guid></item>
</channel></rss>"#;
        let items = parse_items("sparse", doc.as_bytes(), 20).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "");
        assert_eq!(items[0].summary, "");
        assert_eq!(items[0].url, "");
        assert_eq!(items[0].published, "");
    }

    #[test]
    fn test_summary_is_truncated_then_trimmed() {
        let long = "ä".repeat(1000);
        let doc = format!(
            r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title><link>https://example.com</link><description>d</description>
<item><title>  Padded title  </title><link>https://x/long</link><description>{long}</description></item>
</channel></rss>"#
        );
        let items = parse_items("long", doc.as_bytes(), 20).unwrap();

        assert_eq!(items[0].title, "Padded title");
        assert_eq!(items[0].summary.chars().count(), SUMMARY_MAX_CHARS);
        assert!(items[0].summary.chars().all(|c| c == 'ä'));
    }

    #[test]
    fn test_parse_atom_feed() {
        let doc = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom test</title>
  <id>urn:uuid:feed</id>
  <updated>2025-05-06T12:00:00Z</updated>
  <entry>
    <title>Atom entry</title>
    <id>urn:uuid:entry-1</id>
    <link href="https://atom.example/1"/>
    <updated>2025-05-06T12:00:00Z</updated>
    <published>2025-05-05T08:30:00Z</published>
    <summary>Atom summary</summary>
  </entry>
</feed>"#;
        let items = parse_items("atom", doc.as_bytes(), 20).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://atom.example/1");
        assert_eq!(items[0].summary, "Atom summary");
        assert!(items[0].published.starts_with("2025-05-05T08:30:00"));
    }

    #[test]
    fn test_published_falls_back_to_updated() {
        let doc = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom test</title>
  <id>urn:uuid:feed</id>
  <updated>2025-05-06T12:00:00Z</updated>
  <entry>
    <title>Only updated</title>
    <id>urn:uuid:entry-2</id>
    <link href="https://atom.example/2"/>
    <updated>2025-05-04T09:15:00Z</updated>
  </entry>
</feed>"#;
        let items = parse_items("atom", doc.as_bytes(), 20).unwrap();

        assert!(items[0].published.starts_with("2025-05-04T09:15:00"));
    }

    #[test]
    fn test_unparseable_date_keeps_the_item() {
        let doc = rss(&[("Vaalit", "https://yle.example/1")])
            .replace("Tue, 06 May 2025 12:00:00 GMT", "6.5.2025 klo 12.00");
        let items = parse_items("yle", doc.as_bytes(), 20).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://yle.example/1");
        assert_eq!(items[0].published, "");
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(matches!(
            parse_items("bad", b"<html>not a feed", 20),
            Err(HarvestError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_timed_out_feed_is_skipped_others_contribute() {
        let fetcher = StaticFetcher::default()
            .with("https://a/rss", rss(&[("a1", "https://a/1"), ("a2", "https://a/2")]))
            .timing_out("https://b/rss")
            .with("https://c/rss", rss(&[("c1", "https://c/1")]));
        let feeds = vec![
            FeedSource::new("a", "https://a/rss"),
            FeedSource::new("b", "https://b/rss"),
            FeedSource::new("c", "https://c/rss"),
        ];

        let harvest = harvest(&fetcher, &feeds, 20, 1).await;

        let urls: Vec<_> = harvest.items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, ["https://a/1", "https://a/2", "https://c/1"]);
        assert!(harvest.items.iter().all(|i| i.source != "b"));
        assert_eq!(harvest.skipped, ["b"]);
    }

    #[tokio::test]
    async fn test_feed_with_malformed_url_is_skipped_without_fetching() {
        let fetcher = StaticFetcher::default()
            .with("https://a/rss", rss(&[("a1", "https://a/1")]))
            .with("htps//broken", rss(&[("never", "https://broken/1")]))
            .with("https://c/rss", rss(&[("c1", "https://c/1")]));
        let feeds = vec![
            FeedSource::new("a", "https://a/rss"),
            FeedSource::new("typo", "htps//broken"),
            FeedSource::new("c", "https://c/rss"),
        ];

        let harvest = harvest(&fetcher, &feeds, 20, 1).await;

        let urls: Vec<_> = harvest.items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, ["https://a/1", "https://c/1"]);
        assert_eq!(harvest.skipped, ["typo"]);
    }

    #[tokio::test]
    async fn test_no_feeds_harvests_nothing() {
        let harvest = harvest(&StaticFetcher::default(), &[], 20, 1).await;
        assert!(harvest.items.is_empty());
        assert!(harvest.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_feed_is_skipped() {
        let fetcher = StaticFetcher::default()
            .with("https://a/rss", "garbage".to_string())
            .with("https://b/rss", rss(&[("b1", "https://b/1")]));
        let feeds = vec![
            FeedSource::new("a", "https://a/rss"),
            FeedSource::new("b", "https://b/rss"),
        ];

        let harvest = harvest(&fetcher, &feeds, 20, 1).await;

        assert_eq!(harvest.items.len(), 1);
        assert_eq!(harvest.skipped, ["a"]);
    }

    #[tokio::test]
    async fn test_concurrent_harvest_keeps_feed_order() {
        let mut fetcher = StaticFetcher::default()
            .with("https://slow/rss", rss(&[("s", "https://slow/1")]))
            .with("https://fast/rss", rss(&[("f", "https://fast/1")]));
        fetcher.delays_ms.insert("https://slow/rss".to_string(), 50);
        let feeds = vec![
            FeedSource::new("slow", "https://slow/rss"),
            FeedSource::new("fast", "https://fast/rss"),
        ];

        let harvest = harvest(&fetcher, &feeds, 20, 4).await;

        let sources: Vec<_> = harvest.items.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, ["slow", "fast"]);
    }
}
