//! Relevance filtering.

use crate::models::Signal;

/// Keep the signals the classifier marked relevant, in their original order.
///
/// Failure signals are never relevant.
pub fn filter_relevant(signals: Vec<Signal>) -> Vec<Signal> {
    signals.into_iter().filter(Signal::is_relevant).collect()
}
