//! Data models for harvested feed items and their classifications.
//!
//! This module defines the core data structures used throughout the application:
//! - [`CandidateItem`]: A normalized feed entry awaiting classification
//! - [`Classification`]: The validated answer of the language model
//! - [`Signal`]: An item joined with its classification (or a failure marker)
//! - Taxonomy enums: [`Category`], [`SignalStrength`], [`SignalType`], [`Domain`]
//!
//! Field names are snake_case on the wire to match the JSON schema the
//! classifier is asked to produce and the layout of the stored database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error marker stored on signals whose response could not be validated.
pub const JSON_PARSE_ERROR: &str = "json_parse_error";

/// A single feed entry, normalized and ready to be classified.
///
/// Every field defaults to an empty string when the feed omits it, so a
/// sparse entry never prevents the rest of a feed from being harvested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateItem {
    /// Name of the configured feed the entry came from.
    pub source: String,
    /// Entry headline, whitespace-trimmed.
    pub title: String,
    /// Entry summary, truncated to a bounded number of characters.
    pub summary: String,
    /// Link to the article. Used as the identity of the resulting signal.
    pub url: String,
    /// Publication timestamp as reported by the feed.
    pub published: String,
}

/// One of the four scenarios, or `AMBIGUOUS` when none clearly dominates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Strengthens,
    NewDemocracy,
    Weakens,
    Collapse,
    Ambiguous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Weak,
    Moderate,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Emerging,
    Accelerating,
    Plateauing,
    Reversing,
}

/// The part of democratic life a signal touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Epistemic,
    Procedural,
    Institutional,
    Participatory,
    Power,
    Multiple,
}

/// A classification as returned by the model, after schema validation.
///
/// Unknown keys in the response are ignored; missing required keys, values
/// outside an enum and wrongly typed values fail deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub relevant: bool,
    pub primary_category: Category,
    #[serde(default)]
    pub secondary_categories: Vec<Category>,
    pub signal_strength: SignalStrength,
    pub signal_type: SignalType,
    pub domain: Domain,
    /// Clarity of the mapping onto the taxonomy, in `[0.0, 1.0]`.
    pub confidence: f64,
    pub rationale: String,
    #[serde(default)]
    pub secondary_rationale: String,
    pub finnish_relevance: bool,
}

/// Marker left on a signal whose classification call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Always `false`; kept on the wire so stored failures read like the
    /// successful signals.
    pub relevant: bool,
    pub error: String,
}

/// Either a validated classification or the reason there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Classified(Classification),
    Failed(Failure),
}

/// A candidate item joined with the outcome of classifying it.
///
/// Serialized flat: the item fields, the classification (or `relevant` and
/// `error`), and `scanned_at` all share one JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(flatten)]
    pub item: CandidateItem,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub scanned_at: DateTime<Utc>,
}

impl Signal {
    pub fn classified(
        item: CandidateItem,
        classification: Classification,
        scanned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item,
            outcome: Outcome::Classified(classification),
            scanned_at,
        }
    }

    pub fn failed(item: CandidateItem, error: impl Into<String>, scanned_at: DateTime<Utc>) -> Self {
        Self {
            item,
            outcome: Outcome::Failed(Failure {
                relevant: false,
                error: error.into(),
            }),
            scanned_at,
        }
    }

    pub fn url(&self) -> &str {
        &self.item.url
    }

    /// `true` only for a successful classification that marked the item relevant.
    pub fn is_relevant(&self) -> bool {
        self.classification().is_some_and(|c| c.relevant)
    }

    pub fn classification(&self) -> Option<&Classification> {
        match &self.outcome {
            Outcome::Classified(c) => Some(c),
            Outcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Classified(_) => None,
            Outcome::Failed(f) => Some(&f.error),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    pub(crate) fn item(url: &str) -> CandidateItem {
        CandidateItem {
            source: "test_feed".to_string(),
            title: format!("Title for {url}"),
            summary: "Summary".to_string(),
            url: url.to_string(),
            published: String::new(),
        }
    }

    pub(crate) fn weakens() -> Classification {
        Classification {
            relevant: true,
            primary_category: Category::Weakens,
            secondary_categories: vec![Category::Collapse],
            signal_strength: SignalStrength::Moderate,
            signal_type: SignalType::Accelerating,
            domain: Domain::Power,
            confidence: 0.8,
            rationale: "...".to_string(),
            secondary_rationale: "...".to_string(),
            finnish_relevance: false,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_category_wire_names() {
        let json = serde_json::to_string(&Category::NewDemocracy).unwrap();
        assert_eq!(json, "\"NEW_DEMOCRACY\"");
        let parsed: Category = serde_json::from_str("\"AMBIGUOUS\"").unwrap();
        assert_eq!(parsed, Category::Ambiguous);
        assert!(serde_json::from_str::<Category>("\"weakens\"").is_err());
    }

    #[test]
    fn test_classified_signal_serializes_flat() {
        let signal = Signal::classified(item("https://x/1"), weakens(), at());
        let value = serde_json::to_value(&signal).unwrap();

        assert_eq!(value["url"], "https://x/1");
        assert_eq!(value["source"], "test_feed");
        assert_eq!(value["relevant"], true);
        assert_eq!(value["primary_category"], "WEAKENS");
        assert_eq!(value["secondary_categories"], json!(["COLLAPSE"]));
        assert_eq!(value["domain"], "power");
        assert!(value.get("error").is_none());
        assert!(value["scanned_at"].as_str().unwrap().starts_with("2025-05-06T12:00:00"));
    }

    #[test]
    fn test_failed_signal_has_no_classification_fields() {
        let signal = Signal::failed(item("https://x/2"), JSON_PARSE_ERROR, at());
        let value = serde_json::to_value(&signal).unwrap();

        assert_eq!(value["relevant"], false);
        assert_eq!(value["error"], "json_parse_error");
        for key in ["primary_category", "confidence", "rationale", "domain"] {
            assert_eq!(value.get(key), None::<&Value>, "unexpected key {key}");
        }
        assert!(!signal.is_relevant());
        assert!(signal.classification().is_none());
    }

    #[test]
    fn test_signal_deserializes_both_shapes() {
        let ok = Signal::classified(item("https://x/1"), weakens(), at());
        let failed = Signal::failed(item("https://x/2"), "HTTP 529", at());

        let ok_back: Signal = serde_json::from_value(serde_json::to_value(&ok).unwrap()).unwrap();
        let failed_back: Signal =
            serde_json::from_value(serde_json::to_value(&failed).unwrap()).unwrap();

        assert_eq!(ok_back, ok);
        assert_eq!(failed_back.error(), Some("HTTP 529"));
    }

    #[test]
    fn test_irrelevant_classification_is_not_relevant() {
        let mut c = weakens();
        c.relevant = false;
        let signal = Signal::classified(item("https://x/3"), c, at());
        assert!(!signal.is_relevant());
        assert!(signal.error().is_none());
    }
}
