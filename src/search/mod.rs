//! Web search stage: turns a query into a lazy stream of candidate URLs.
//!
//! # Architecture
//!
//! - [`SearchProvider`] - Async trait a search backend implements (one page per call)
//! - [`GoogleSearch`] - Default provider scraping the plain HTML results page
//! - [`run_query`] - Pages through a provider lazily, de-duplicating and
//!   bounding results, and swallowing provider failures
//!
//! # Example
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use pdf_harvest::search::{GoogleSearch, SearchQuery, run_query};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = GoogleSearch::new()?;
//! let query = SearchQuery::new("filetype:pdf site:example.com", 20, "en");
//! let mut urls = run_query(&provider, &query);
//! while let Some(url) = urls.next().await {
//!     println!("{url}");
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod google;

pub use error::SearchError;
pub use google::{GOOGLE_BASE_URL, GoogleSearch};

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use tracing::{debug, info, warn};

/// A search request: query text, result budget and language hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    max_results: usize,
    language: String,
}

impl SearchQuery {
    /// Creates a query. `max_results` is the upper bound on yielded URLs.
    #[must_use]
    pub fn new(text: impl Into<String>, max_results: usize, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            max_results,
            language: language.into(),
        }
    }

    /// Query string sent to the provider.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Maximum number of URLs the query may yield.
    #[must_use]
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Language hint, e.g. `en`.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }
}

/// A web search backend returning result URLs one page at a time.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &str;

    /// Fetches one page of result URLs.
    ///
    /// `start` is the zero-based index of the first wanted result and
    /// `wanted` how many results are still needed. Returning an empty page
    /// ends the search.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] when the provider cannot be queried.
    async fn fetch_page(
        &self,
        query: &SearchQuery,
        start: usize,
        wanted: usize,
    ) -> Result<Vec<String>, SearchError>;

    /// Pause between consecutive page requests.
    fn page_interval(&self) -> Duration {
        Duration::ZERO
    }
}

struct PageCursor<'a> {
    provider: &'a dyn SearchProvider,
    query: &'a SearchQuery,
    start: usize,
    emitted: usize,
    pages_fetched: usize,
    seen: HashSet<String>,
    pending: VecDeque<String>,
    exhausted: bool,
}

impl PageCursor<'_> {
    async fn next_url(&mut self) -> Option<String> {
        loop {
            if self.emitted >= self.query.max_results() {
                return None;
            }
            if let Some(url) = self.pending.pop_front() {
                self.emitted += 1;
                return Some(url);
            }
            if self.exhausted {
                return None;
            }
            self.fill().await;
        }
    }

    async fn fill(&mut self) {
        let interval = self.provider.page_interval();
        if self.pages_fetched > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }

        let wanted = self.query.max_results() - self.emitted;
        let page = match self.provider.fetch_page(self.query, self.start, wanted).await {
            Ok(page) => page,
            Err(error) => {
                warn!(
                    provider = self.provider.name(),
                    query = self.query.text(),
                    error = %error,
                    "search failed"
                );
                warn!(
                    "this may be caused by search provider limits, network problems or temporary blocking"
                );
                self.exhausted = true;
                return;
            }
        };
        self.pages_fetched += 1;
        self.start += page.len();

        let before = self.pending.len();
        for url in page {
            if self.seen.insert(url.clone()) {
                self.pending.push_back(url);
            }
        }
        let fresh = self.pending.len() - before;
        debug!(
            provider = self.provider.name(),
            page = self.pages_fetched,
            fresh,
            "fetched search page"
        );
        if fresh == 0 {
            self.exhausted = true;
        }
    }
}

/// Runs `query` against `provider` as a lazy stream of unique URLs.
///
/// Pages are requested only as the stream is polled. The stream ends after
/// `max_results` URLs, when a page brings nothing new, or when the provider
/// fails; failures are logged and never surface to the caller. The stream is
/// not restartable: call again to re-issue the search.
pub fn run_query<'a>(provider: &'a dyn SearchProvider, query: &'a SearchQuery) -> BoxStream<'a, String> {
    info!(
        provider = provider.name(),
        query = query.text(),
        max_results = query.max_results(),
        "starting web search"
    );
    let cursor = PageCursor {
        provider,
        query,
        start: 0,
        emitted: 0,
        pages_fetched: 0,
        seen: HashSet::new(),
        pending: VecDeque::new(),
        exhausted: false,
    };
    stream::unfold(cursor, |mut cursor| async move {
        let url = cursor.next_url().await?;
        Some((url, cursor))
    })
    .boxed()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Serves canned pages in order and records every `(start, wanted)` request.
    struct ScriptedProvider {
        pages: Mutex<VecDeque<Result<Vec<String>, SearchError>>>,
        requests: Mutex<Vec<(usize, usize)>>,
    }

    impl ScriptedProvider {
        fn new(pages: Vec<Result<Vec<&str>, SearchError>>) -> Self {
            let pages = pages
                .into_iter()
                .map(|page| page.map(|urls| urls.into_iter().map(String::from).collect()))
                .collect();
            Self {
                pages: Mutex::new(pages),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(usize, usize)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_page(
            &self,
            _query: &SearchQuery,
            start: usize,
            wanted: usize,
        ) -> Result<Vec<String>, SearchError> {
            self.requests.lock().unwrap().push((start, wanted));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn query(max: usize) -> SearchQuery {
        SearchQuery::new("filetype:pdf site:example.test", max, "en")
    }

    #[tokio::test]
    async fn test_run_query_pages_until_empty_page() {
        let provider = ScriptedProvider::new(vec![
            Ok(vec!["https://example.test/a.pdf", "https://example.test/b.pdf"]),
            Ok(vec!["https://example.test/c.pdf"]),
            Ok(vec![]),
        ]);
        let query = query(10);
        let urls: Vec<String> = run_query(&provider, &query).collect().await;

        assert_eq!(
            urls,
            vec![
                "https://example.test/a.pdf",
                "https://example.test/b.pdf",
                "https://example.test/c.pdf"
            ]
        );
        assert_eq!(provider.requests(), vec![(0, 10), (2, 8), (3, 7)]);
    }

    #[tokio::test]
    async fn test_run_query_stops_at_max_results() {
        let provider = ScriptedProvider::new(vec![
            Ok(vec!["https://example.test/a.pdf", "https://example.test/b.pdf"]),
            Ok(vec!["https://example.test/c.pdf"]),
        ]);
        let query = query(2);
        let urls: Vec<String> = run_query(&provider, &query).collect().await;

        assert_eq!(urls.len(), 2);
        assert_eq!(provider.requests().len(), 1, "second page must not be fetched");
    }

    #[tokio::test]
    async fn test_run_query_collapses_duplicates_across_pages() {
        let provider = ScriptedProvider::new(vec![
            Ok(vec!["https://example.test/a.pdf", "https://example.test/a.pdf"]),
            Ok(vec!["https://example.test/a.pdf", "https://example.test/b.pdf"]),
            Ok(vec!["https://example.test/b.pdf"]),
        ]);
        let query = query(10);
        let urls: Vec<String> = run_query(&provider, &query).collect().await;

        assert_eq!(
            urls,
            vec!["https://example.test/a.pdf", "https://example.test/b.pdf"]
        );
        assert_eq!(
            provider.requests().len(),
            3,
            "a page with nothing new ends the search"
        );
    }

    #[tokio::test]
    async fn test_run_query_swallows_provider_failure() {
        let provider = ScriptedProvider::new(vec![Err(SearchError::RateLimited {
            provider: "scripted".to_string(),
        })]);
        let query = query(10);
        let urls: Vec<String> = run_query(&provider, &query).collect().await;
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_run_query_keeps_results_from_pages_before_failure() {
        let provider = ScriptedProvider::new(vec![
            Ok(vec!["https://example.test/a.pdf"]),
            Err(SearchError::HttpStatus {
                provider: "scripted".to_string(),
                status: 503,
            }),
        ]);
        let query = query(10);
        let urls: Vec<String> = run_query(&provider, &query).collect().await;
        assert_eq!(urls, vec!["https://example.test/a.pdf"]);
    }

    #[tokio::test]
    async fn test_run_query_is_lazy() {
        let provider = ScriptedProvider::new(vec![Ok(vec!["https://example.test/a.pdf"])]);
        let query = query(10);
        let stream = run_query(&provider, &query);
        assert!(provider.requests().is_empty(), "no page before first poll");
        drop(stream);
    }
}
