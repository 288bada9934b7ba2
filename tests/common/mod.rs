use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use pagepulse::checker::fetcher::{FetchError, PageFetcher};

/// Serves canned fetch results per URL, in push order.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, VecDeque<Result<String, FetchError>>>>,
}

impl StubFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn push(&self, url: &str, response: Result<String, FetchError>) {
        self.responses
            .lock()
            .await
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.responses
            .lock()
            .await
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| panic!("no canned response left for {url}"))
    }
}
