//! Utility functions for string shaping and file system preparation.
//!
//! This module provides helper functions used throughout the application:
//! - Character-safe truncation for summaries and log previews
//! - JSON error detection for spotting responses cut off by the token cap
//! - Parent directory creation before the store is written

use std::io;
use std::path::Path;
use tokio::fs;

/// Truncate a string to at most `max` characters.
///
/// Cuts on a character boundary, so multi-byte text (Finnish sources carry
/// plenty of `ä` and `ö`) never panics.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_chars("päivä", 3), "päi");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Returns
///
/// The original string if shorter than `max`, otherwise a truncated version
/// with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let head = truncate_chars(s, max);
    if head.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", head, s.len() - head.len())
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the model's answer is cut off by the response-length cap, the
/// resulting JSON fails with an EOF error. The classifier logs this case
/// separately so an undersized `max_tokens` is easy to spot.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Create the parent directory of `path` if it does not exist yet.
pub async fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}
