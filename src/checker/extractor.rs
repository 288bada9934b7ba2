//! Best-effort narrowing of raw markup to a `#id` or `.class` sub-region.

use regex::Regex;

/// Returns the inner content of the first element matching a simple id or
/// class selector, or `None` when the selector does not match (callers fall
/// back to the full markup).
///
/// This is pattern matching, not an HTML parser: the captured region ends at
/// the next closing tag, so a nested element of the same name truncates the
/// result early.
pub fn extract(markup: &str, selector: &str) -> Option<String> {
    let pattern = if let Some(id) = selector.strip_prefix('#') {
        format!(r#"(?is)id=["']{}["'][^>]*>(.*?)</"#, regex::escape(id))
    } else if let Some(class) = selector.strip_prefix('.') {
        format!(
            r#"(?is)class=["'][^"']*{}[^"']*["'][^>]*>(.*?)</"#,
            regex::escape(class)
        )
    } else {
        return None;
    };

    // The selector name is escaped above, so the pattern is always valid.
    let re = Regex::new(&pattern).ok()?;
    re.captures(markup)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
