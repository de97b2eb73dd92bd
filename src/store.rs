//! The signal database: one JSON array on disk, deduplicated by URL.
//!
//! Entries already on disk are treated as opaque JSON objects. Only their
//! `url` is inspected, so fields written by older versions of the scanner
//! (or by hand) survive a rewrite unchanged.
//!
//! # Lifecycle
//!
//! 1. [`SignalStore::load`] at the start of a run; a missing or unreadable
//!    document yields an empty collection instead of an error
//! 2. [`merge`] the run's relevant signals; first-seen URL wins
//! 3. [`SignalStore::persist`] once at the end, replacing the file atomically

use crate::error::StoreError;
use crate::models::Signal;
use crate::utils::ensure_parent_dir;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// One entry of the database, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredSignal(Map<String, Value>);

impl StoredSignal {
    pub fn from_signal(signal: &Signal) -> Result<Self, StoreError> {
        match serde_json::to_value(signal)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StoreError::Serialization(serde::ser::Error::custom(format!(
                "signal serialized to a non-object: {other}"
            )))),
        }
    }

    /// The dedup key. `None` for hand-edited entries without a string `url`.
    pub fn url(&self) -> Option<&str> {
        self.get("url").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Result of merging a run's signals into the existing collection.
#[derive(Debug)]
pub struct Merge {
    /// Existing entries followed by the newly accepted ones.
    pub signals: Vec<StoredSignal>,
    /// How many incoming signals were accepted.
    pub added: usize,
}

impl Merge {
    pub fn total(&self) -> usize {
        self.signals.len()
    }
}

/// Append the incoming signals whose URL is not stored yet.
///
/// Existing entries are never reordered, replaced or removed. Among incoming
/// signals sharing a URL only the first is kept.
pub fn merge(existing: Vec<StoredSignal>, incoming: Vec<Signal>) -> Result<Merge, StoreError> {
    let mut seen: HashSet<String> = existing
        .iter()
        .filter_map(|s| s.url().map(str::to_string))
        .collect();

    let mut signals = existing;
    let mut added = 0;
    for signal in incoming {
        if seen.insert(signal.url().to_string()) {
            signals.push(StoredSignal::from_signal(&signal)?);
            added += 1;
        }
    }
    Ok(Merge { signals, added })
}

/// File-backed signal database.
#[derive(Debug, Clone)]
pub struct SignalStore {
    path: PathBuf,
}

impl SignalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored collection. Never fails: a missing, unreadable or
    /// malformed document is treated as an empty database.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Vec<StoredSignal> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No signal database yet; starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Could not read signal database; starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<StoredSignal>>(&raw) {
            Ok(signals) => {
                info!(count = signals.len(), "Loaded signal database");
                signals
            }
            Err(e) => {
                warn!(error = %e, "Signal database is not a JSON array of objects; starting empty");
                Vec::new()
            }
        }
    }

    /// Replace the stored document with `signals`.
    ///
    /// The document is written next to the target and renamed over it, so
    /// readers see either the old or the new collection, never a partial one.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = signals.len()))]
    pub async fn persist(&self, signals: &[StoredSignal]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(signals)?;

        ensure_parent_dir(&self.path).await.map_err(|source| self.io_error(source))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json).await.map_err(|source| self.io_error(source))?;
        if let Err(source) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(self.io_error(source));
        }

        info!("Wrote signal database");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "signals.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
