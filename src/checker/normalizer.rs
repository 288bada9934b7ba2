//! Markup normalization and content fingerprinting.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

const PREVIEW_CHARS: usize = 300;
const TEXT_CHARS: usize = 10_000;

static SCRIPT_BLOCKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<script.*?</script>").unwrap());
static STYLE_BLOCKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style.*?</style>").unwrap());
static HTML_COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// The distilled form of one page observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPage {
    /// Hex SHA-256 over the normalized, still-tagged markup. Markup edits
    /// that leave the visible text unchanged still move this value.
    pub hash: String,
    /// First 300 chars of the normalized markup, for display only.
    pub preview: String,
    /// Tag-stripped text used for diffing and keyword matching.
    pub text: String,
}

pub fn normalize(markup: &str) -> NormalizedPage {
    let without_scripts = SCRIPT_BLOCKS.replace_all(markup, "");
    let without_styles = STYLE_BLOCKS.replace_all(&without_scripts, "");
    let without_comments = HTML_COMMENTS.replace_all(&without_styles, "");
    let normalized = WHITESPACE_RUNS
        .replace_all(&without_comments, " ")
        .trim()
        .to_string();

    let hash = hex::encode(Sha256::digest(normalized.as_bytes()));

    let untagged = TAGS.replace_all(&normalized, " ");
    let text = WHITESPACE_RUNS.replace_all(&untagged, " ").trim().to_string();

    NormalizedPage {
        hash,
        preview: truncate_chars(&normalized, PREVIEW_CHARS),
        text: truncate_chars(&text, TEXT_CHARS),
    }
}

fn truncate_chars(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
