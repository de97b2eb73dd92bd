//! Classification of candidate items.
//!
//! One prompt per item, one answer per prompt. The answer must be a single
//! JSON object matching [`Classification`]; anything else (prose around the
//! object, code fences, unknown enum values, a confidence outside `[0, 1]`)
//! is a schema error. The classifier never retries on its own, see
//! [`crate::api::RetryAsk`] for the opt-in transport retries.

use crate::api::AskAsync;
use crate::error::ClassificationError;
use crate::models::{CandidateItem, Classification, Signal};
use crate::prompt;
use crate::utils::{looks_truncated, truncate_for_log};
use chrono::Utc;
use itertools::Itertools;
use tracing::{debug, instrument, warn};

/// Sends items to a language model and validates its answers.
#[derive(Debug)]
pub struct Classifier<A> {
    api: A,
}

impl<A: AskAsync> Classifier<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Classify one item.
    ///
    /// On success the returned signal carries the validated classification and
    /// is stamped with the time the answer arrived.
    #[instrument(level = "debug", skip_all, fields(source = %item.source, url = %item.url))]
    pub async fn classify(&self, item: &CandidateItem) -> Result<Signal, ClassificationError> {
        let raw = self.api.ask(&prompt::render(item)).await?;
        let scanned_at = Utc::now();
        let classification = parse_classification(&raw).inspect_err(|e| {
            warn!(
                title = %truncate_for_log(&item.title, 40),
                error = %e,
                response_preview = %truncate_for_log(raw.trim(), 300),
                "Model returned non-conforming JSON"
            );
        })?;
        debug!(
            relevant = classification.relevant,
            primary = ?classification.primary_category,
            confidence = classification.confidence,
            "Classified item"
        );
        Ok(Signal::classified(item.clone(), classification, scanned_at))
    }
}

/// Parse and validate a raw model answer.
///
/// Surrounding whitespace is ignored; everything else must be the object.
/// The primary category is dropped from the secondary list and repeated
/// secondaries are collapsed, keeping the first occurrence.
pub fn parse_classification(raw: &str) -> Result<Classification, ClassificationError> {
    let mut classification: Classification =
        serde_json::from_str(raw.trim()).inspect_err(|e| {
            if looks_truncated(e) {
                warn!(error = %e, "Answer ends mid-object; max_tokens may be too small");
            }
        })?;

    if !(0.0..=1.0).contains(&classification.confidence) {
        return Err(ClassificationError::Schema(format!(
            "confidence {} outside [0, 1]",
            classification.confidence
        )));
    }

    let primary = classification.primary_category;
    classification.secondary_categories = std::mem::take(&mut classification.secondary_categories)
        .into_iter()
        .filter(|c| *c != primary)
        .unique()
        .collect();

    Ok(classification)
}
