//! Word-level difference between two plain-text snapshots.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

// Tokens must be strictly longer than this to register.
const MIN_WORD_CHARS: usize = 2;
const MAX_LISTED_WORDS: usize = 20;
const SUMMARY_WORDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_match: Option<String>,
}

/// Word-set difference between two snapshots. Returns `None` when either
/// side is empty (no baseline to compare against).
///
/// This is a bag-of-words approximation, not a sequence alignment:
/// reordering or repeating existing words does not register as a change.
pub fn compute_diff(old_text: &str, new_text: &str) -> Option<ContentDiff> {
    if old_text.is_empty() || new_text.is_empty() {
        return None;
    }

    let old_words: Vec<&str> = old_text.split_whitespace().collect();
    let new_words: Vec<&str> = new_text.split_whitespace().collect();
    let old_set: HashSet<&str> = old_words.iter().copied().collect();
    let new_set: HashSet<&str> = new_words.iter().copied().collect();

    let added: Vec<&str> = new_words
        .iter()
        .copied()
        .filter(|w| w.chars().count() > MIN_WORD_CHARS && !old_set.contains(w))
        .collect();
    let removed: Vec<&str> = old_words
        .iter()
        .copied()
        .filter(|w| w.chars().count() > MIN_WORD_CHARS && !new_set.contains(w))
        .collect();

    let mut summary = String::new();
    if !removed.is_empty() {
        summary.push_str(&format!(
            "Removed: \"{}{}\" ",
            removed[..removed.len().min(SUMMARY_WORDS)].join(", "),
            if removed.len() > SUMMARY_WORDS { "..." } else { "" },
        ));
    }
    if !added.is_empty() {
        summary.push_str(&format!(
            "Added: \"{}{}\"",
            added[..added.len().min(SUMMARY_WORDS)].join(", "),
            if added.len() > SUMMARY_WORDS { "..." } else { "" },
        ));
    }
    let summary = summary.trim().to_string();

    Some(ContentDiff {
        added: added
            .into_iter()
            .take(MAX_LISTED_WORDS)
            .map(str::to_string)
            .collect(),
        removed: removed
            .into_iter()
            .take(MAX_LISTED_WORDS)
            .map(str::to_string)
            .collect(),
        summary: if summary.is_empty() {
            "Content structure changed".to_string()
        } else {
            summary
        },
        keyword_match: None,
    })
}
