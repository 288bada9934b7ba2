//! Change-detection pipeline: fetch, narrow, normalize, diff, decide.

pub mod differ;
pub mod extractor;
pub mod fetcher;
pub mod keywords;
pub mod normalizer;

pub use differ::{ContentDiff, compute_diff};
pub use fetcher::{FetchError, HttpFetcher, PageFetcher};
pub use keywords::{KeywordMode, KeywordVerdict, evaluate_keywords};
pub use normalizer::{NormalizedPage, normalize};

/// Fetches a page, narrows it to the configured selector and normalizes it
/// into a fingerprint plus text projections.
pub async fn check_page(
    fetcher: &dyn PageFetcher,
    url: &str,
    selector: Option<&str>,
) -> Result<NormalizedPage, FetchError> {
    let body = fetcher.fetch(url).await?;
    // A selector that matches nothing falls back to the whole page.
    let scoped = match selector.and_then(|sel| extractor::extract(&body, sel)) {
        Some(inner) => inner,
        None => body,
    };
    Ok(normalize(&scoped))
}
