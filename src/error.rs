//! Error types for each stage of a scan.
//!
//! Only [`ConfigError`] ever aborts a run, and only before any network
//! activity. Harvest errors (a malformed feed URL included) skip a feed,
//! classification errors turn into failure signals, and store read errors
//! fall back to an empty database; see the respective modules.

use crate::models::JSON_PARSE_ERROR;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ANTHROPIC_API_KEY environment variable is not set")]
    MissingCredential,

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),

}

/// Why a single feed contributed nothing to a harvest.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("feed parse error: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

/// Why a single item could not be classified.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response contained no text block")]
    EmptyResponse,

    #[error("invalid classification: {0}")]
    Schema(String),
}

impl ClassificationError {
    /// The value recorded in the failure signal's `error` field.
    ///
    /// Schema problems collapse onto one stable marker; transport problems
    /// keep their description.
    pub fn signal_error(&self) -> String {
        match self {
            ClassificationError::Schema(_) => JSON_PARSE_ERROR.to_string(),
            other => other.to_string(),
        }
    }

    /// Transport failures may succeed on another attempt; a malformed answer
    /// is the model's final word for this run.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ClassificationError::Schema(_))
    }
}

impl From<serde_json::Error> for ClassificationError {
    fn from(e: serde_json::Error) -> Self {
        ClassificationError::Schema(e.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
