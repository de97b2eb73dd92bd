//! Run configuration: the feed list, scan settings and the API credential.
//!
//! Settings come from a YAML file (or the built-in `feeds.yaml` when no file
//! is given) and may be overridden from the command line, see [`crate::cli`].
//! The credential is kept apart from the rest so it is never logged.
//!
//! ```yaml
//! feeds:
//!   yle_uutiset: "https://feeds.yle.fi/uutiset/v1/recent.rss"
//!   edri: "https://edri.org/feed/"
//! articles_per_feed: 20
//! output_file: signals.json
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const BUILTIN_CONFIG: &str = include_str!("../feeds.yaml");

/// A named feed. Names identify the source on every harvested item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Settings for a single scan.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    /// Feeds to harvest, in file order.
    #[serde(deserialize_with = "feeds_in_order")]
    pub feeds: Vec<FeedSource>,
    /// Maximum number of entries taken from each feed.
    pub articles_per_feed: usize,
    /// Location of the signal database.
    pub output_file: PathBuf,
    pub model: String,
    /// Response-length cap sent with each classification request.
    pub max_tokens: u32,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub feed_timeout_secs: u64,
    pub user_agent: String,
    pub harvest_concurrency: usize,
    pub classify_concurrency: usize,
    /// Extra attempts after a transport failure. Zero means one attempt per item.
    pub max_retries: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            articles_per_feed: 20,
            output_file: PathBuf::from("signals.json"),
            model: "claude-sonnet-4-6".to_string(),
            max_tokens: 600,
            api_base_url: "https://api.anthropic.com".to_string(),
            request_timeout_secs: 60,
            feed_timeout_secs: 30,
            user_agent: concat!("democracy_signals/", env!("CARGO_PKG_VERSION")).to_string(),
            harvest_concurrency: 1,
            classify_concurrency: 1,
            max_retries: 0,
        }
    }
}

impl ScannerConfig {
    /// Parse a YAML document. Keys that are absent take their default value.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The configuration shipped with the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml(BUILTIN_CONFIG)
    }

    /// Load from `path`, or fall back to the built-in configuration.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let yaml = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ConfigError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Self::from_yaml(&yaml)?
            }
            None => Self::builtin()?,
        };
        info!(feeds = config.feeds.len(), "Loaded configuration");
        Ok(config)
    }
}

fn feeds_in_order<'de, D>(deserializer: D) -> Result<Vec<FeedSource>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let mapping = serde_yaml::Mapping::deserialize(deserializer)?;
    mapping
        .into_iter()
        .map(|(name, url)| match (name, url) {
            (serde_yaml::Value::String(name), serde_yaml::Value::String(url)) => {
                Ok(FeedSource::new(name, url))
            }
            (name, _) => Err(D::Error::custom(format!(
                "feed {name:?} must map a name to a URL string"
            ))),
        })
        .collect()
}

/// The classification service API key.
///
/// Construction fails on a missing or blank value, which is the only
/// condition that aborts a run.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: Option<String>) -> Result<Self, ConfigError> {
        match raw.map(|s| s.trim().to_string()) {
            Some(key) if !key.is_empty() => Ok(Self(key)),
            _ => Err(ConfigError::MissingCredential),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
