//! Keyword-gated notification decisioning.

use serde::{Deserialize, Serialize};

/// Which keyword transition lets a detected change through to notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordMode {
    /// Any keyword appearing or disappearing.
    #[default]
    Any,
    /// Every keyword currently present in the new text.
    All,
    /// At least one keyword newly present.
    Appear,
    /// At least one keyword newly absent.
    Disappear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordVerdict {
    pub should_notify: bool,
    pub matched_keywords: Vec<String>,
    pub reason: Option<String>,
}

impl KeywordVerdict {
    fn notify(matched_keywords: Vec<String>, reason: String) -> Self {
        Self {
            should_notify: true,
            matched_keywords,
            reason: Some(reason),
        }
    }

    fn skip(matched_keywords: Vec<String>, reason: String) -> Self {
        Self {
            should_notify: false,
            matched_keywords,
            reason: Some(reason),
        }
    }
}

/// Decides whether a detected change should notify. Keywords are matched as
/// case-insensitive substrings of the old and new plain text; an empty
/// keyword list never filters.
pub fn evaluate_keywords(
    old_text: &str,
    new_text: &str,
    keywords: &[String],
    mode: KeywordMode,
) -> KeywordVerdict {
    if keywords.is_empty() {
        return KeywordVerdict {
            should_notify: true,
            matched_keywords: Vec::new(),
            reason: None,
        };
    }

    let old_lower = old_text.to_lowercase();
    let new_lower = new_text.to_lowercase();

    let mut appeared = Vec::new();
    let mut disappeared = Vec::new();
    let mut present = Vec::new();

    for keyword in keywords {
        let kw = keyword.to_lowercase();
        let was_present = old_lower.contains(&kw);
        let is_present = new_lower.contains(&kw);

        if !was_present && is_present {
            appeared.push(kw.clone());
        }
        if was_present && !is_present {
            disappeared.push(kw.clone());
        }
        if is_present {
            present.push(kw);
        }
    }

    match mode {
        KeywordMode::Appear => {
            if appeared.is_empty() {
                KeywordVerdict::skip(Vec::new(), "No keywords appeared".to_string())
            } else {
                let reason = format!("Keywords appeared: {}", appeared.join(", "));
                KeywordVerdict::notify(appeared, reason)
            }
        }
        KeywordMode::Disappear => {
            if disappeared.is_empty() {
                KeywordVerdict::skip(Vec::new(), "No keywords disappeared".to_string())
            } else {
                let reason = format!("Keywords disappeared: {}", disappeared.join(", "));
                KeywordVerdict::notify(disappeared, reason)
            }
        }
        KeywordMode::All => {
            if present.len() == keywords.len() {
                let reason = format!("All keywords found: {}", present.join(", "));
                KeywordVerdict::notify(present, reason)
            } else {
                KeywordVerdict::skip(present, "Not all keywords found".to_string())
            }
        }
        KeywordMode::Any => {
            if appeared.is_empty() && disappeared.is_empty() {
                KeywordVerdict::skip(Vec::new(), "No keyword changes".to_string())
            } else {
                let mut changes = Vec::new();
                if !appeared.is_empty() {
                    changes.push(format!("appeared: {}", appeared.join(", ")));
                }
                if !disappeared.is_empty() {
                    changes.push(format!("disappeared: {}", disappeared.join(", ")));
                }
                let reason = format!("Keywords {}", changes.join("; "));
                let mut matched = appeared;
                matched.append(&mut disappeared);
                KeywordVerdict::notify(matched, reason)
            }
        }
    }
}
