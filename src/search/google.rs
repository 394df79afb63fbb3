//! Google web search provider backed by the plain HTML results page.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use super::{SearchError, SearchProvider, SearchQuery};
use crate::user_agent;

/// Production endpoint for [`GoogleSearch`].
pub const GOOGLE_BASE_URL: &str = "https://www.google.com";

const PROVIDER_NAME: &str = "google";

const SEARCH_TIMEOUT_SECS: u64 = 10;

/// Pre-accepted consent cookies; without them the first request lands on a consent wall.
const CONSENT_COOKIE: &str = "CONSENT=PENDING+987; SOCS=CAESHAgBEhIaAB";

/// Results requested beyond what is still wanted; pages often come back short.
const PAGE_SLACK: usize = 2;

/// Largest `num` the results page honours.
const MAX_PAGE_SIZE: usize = 100;

/// Scrapes result links from Google's HTML results page.
///
/// Requests identify as a text browser so the page is served without
/// scripts and every organic result is a `/url?q=<target>` redirect link.
#[derive(Debug, Clone)]
pub struct GoogleSearch {
    client: Client,
    base_url: Url,
    page_interval: Duration,
}

impl GoogleSearch {
    /// Creates a provider against [`GOOGLE_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, SearchError> {
        Self::with_base_url(GOOGLE_BASE_URL)
    }

    /// Creates a provider against a custom endpoint (used by tests and mirrors).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidEndpoint`] for an unparseable base URL and
    /// [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(base_url: &str) -> Result<Self, SearchError> {
        let parsed = Url::parse(base_url).map_err(|_| SearchError::InvalidEndpoint {
            url: base_url.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(CONSENT_COOKIE));
        let client = Client::builder()
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .gzip(true)
            .user_agent(user_agent::default_search_user_agent())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
            page_interval: Duration::ZERO,
        })
    }

    /// Sets the pause between consecutive page requests.
    #[must_use]
    pub fn with_page_interval(mut self, interval: Duration) -> Self {
        self.page_interval = interval;
        self
    }

    fn page_url(&self, query: &SearchQuery, start: usize, wanted: usize) -> Result<Url, SearchError> {
        let mut url = self
            .base_url
            .join("search")
            .map_err(|_| SearchError::InvalidEndpoint {
                url: self.base_url.to_string(),
            })?;
        let num = (wanted + PAGE_SLACK).min(MAX_PAGE_SIZE);
        url.query_pairs_mut()
            .append_pair("q", query.text())
            .append_pair("num", &num.to_string())
            .append_pair("hl", query.language())
            .append_pair("start", &start.to_string())
            .append_pair("safe", "active");
        Ok(url)
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[instrument(skip(self, query), fields(query = query.text()))]
    async fn fetch_page(
        &self,
        query: &SearchQuery,
        start: usize,
        wanted: usize,
    ) -> Result<Vec<String>, SearchError> {
        let url = self.page_url(query, start, wanted)?;
        debug!(url = %url, "requesting search page");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        // Blocked clients are redirected to /sorry/ with a captcha.
        if status.as_u16() == 429 || response.url().path().starts_with("/sorry") {
            return Err(SearchError::RateLimited {
                provider: PROVIDER_NAME.to_string(),
            });
        }
        if !status.is_success() {
            return Err(SearchError::HttpStatus {
                provider: PROVIDER_NAME.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let links = extract_result_links(&body, &self.base_url);
        debug!(count = links.len(), "parsed search page");
        Ok(links)
    }

    fn page_interval(&self) -> Duration {
        self.page_interval
    }
}

/// Pulls organic result URLs out of a results page, in page order, without duplicates.
pub(crate) fn extract_result_links(html: &str, base_url: &Url) -> Vec<String> {
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let provider_host = base_url.host_str().unwrap_or_default();
    let mut links: Vec<String> = Vec::new();

    for href in document
        .select(&anchor_selector)
        .filter_map(|anchor| anchor.value().attr("href"))
    {
        let Some(target) = resolve_result_href(href.trim(), base_url) else {
            continue;
        };
        if is_provider_link(&target, provider_host) {
            continue;
        }
        let target = target.to_string();
        if !links.contains(&target) {
            links.push(target);
        }
    }

    links
}

fn resolve_result_href(href: &str, base_url: &Url) -> Option<Url> {
    let target = if href.starts_with("/url?") {
        let redirect = base_url.join(href).ok()?;
        let (_, value) = redirect
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")?;
        Url::parse(&value).ok()?
    } else if href.starts_with("http://") || href.starts_with("https://") {
        Url::parse(href).ok()?
    } else {
        return None;
    };

    matches!(target.scheme(), "http" | "https").then_some(target)
}

fn is_provider_link(url: &Url, provider_host: &str) -> bool {
    let Some(host) = url.host_str() else {
        return true;
    };
    host == provider_host || host.split('.').any(|label| label == "google")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_PAGE: &str = r#"
        <html><body>
        <div><a href="/url?q=https://example.test/a.pdf&amp;sa=U&amp;ved=2ah">A</a></div>
        <div><a href="https://example.test/b.pdf">B</a></div>
        <div><a href="https://accounts.google.com/ServiceLogin">Sign in</a></div>
        <div><a href="/search?q=next&amp;start=10">Next</a></div>
        <div><a href="/url?q=https://example.test/a.pdf&amp;sa=U">A again</a></div>
        <div><a href="mailto:someone@example.test">Mail</a></div>
        </body></html>
    "#;

    fn google_base() -> Url {
        Url::parse(GOOGLE_BASE_URL).unwrap()
    }

    #[test]
    fn test_extract_result_links_keeps_organic_results_in_order() {
        let links = extract_result_links(RESULTS_PAGE, &google_base());
        assert_eq!(
            links,
            vec!["https://example.test/a.pdf", "https://example.test/b.pdf"]
        );
    }

    #[test]
    fn test_extract_result_links_decodes_redirect_target() {
        let html = r#"<a href="/url?q=https://example.test/docs/My%2520File.PDF&amp;sa=U">x</a>"#;
        let links = extract_result_links(html, &google_base());
        assert_eq!(links, vec!["https://example.test/docs/My%20File.PDF"]);
    }

    #[test]
    fn test_extract_result_links_accepts_any_attribute_quoting() {
        let html = concat!(
            "<a href='/url?q=https://example.test/a.pdf&amp;sa=U'>A</a>",
            "<a href=\"/url?q=https://example.test/b.pdf&#38;sa=U\">B</a>",
            "<a href=https://example.test/c.pdf>C</a>",
        );
        let links = extract_result_links(html, &google_base());
        assert_eq!(
            links,
            vec![
                "https://example.test/a.pdf",
                "https://example.test/b.pdf",
                "https://example.test/c.pdf",
            ]
        );
    }

    #[test]
    fn test_extract_result_links_empty_page() {
        let links = extract_result_links("<html><body>No results</body></html>", &google_base());
        assert!(links.is_empty());
    }

    #[test]
    fn test_with_base_url_rejects_garbage() {
        let result = GoogleSearch::with_base_url("not a url");
        assert!(matches!(result, Err(SearchError::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_page_url_carries_query_parameters() {
        let provider = GoogleSearch::new().unwrap();
        let query = SearchQuery::new("filetype:pdf site:example.test", 150, "en");
        let url = provider.page_url(&query, 10, 140).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(url.path(), "/search");
        assert!(pairs.contains(&("q".to_string(), "filetype:pdf site:example.test".to_string())));
        assert!(pairs.contains(&("num".to_string(), "100".to_string())));
        assert!(pairs.contains(&("hl".to_string(), "en".to_string())));
        assert!(pairs.contains(&("start".to_string(), "10".to_string())));
    }

    #[tokio::test]
    async fn test_fetch_page_parses_mocked_results() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "filetype:pdf site:example.test"))
            .and(query_param("num", "7"))
            .and(query_param("hl", "en"))
            .and(query_param("start", "0"))
            .and(header_exists("cookie"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&mock_server)
            .await;

        let provider = GoogleSearch::with_base_url(&mock_server.uri()).unwrap();
        let query = SearchQuery::new("filetype:pdf site:example.test", 5, "en");
        let links = provider.fetch_page(&query, 0, 5).await.unwrap();

        assert_eq!(
            links,
            vec!["https://example.test/a.pdf", "https://example.test/b.pdf"]
        );
    }

    #[tokio::test]
    async fn test_fetch_page_maps_429_to_rate_limited() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let provider = GoogleSearch::with_base_url(&mock_server.uri()).unwrap();
        let query = SearchQuery::new("anything", 5, "en");
        let result = provider.fetch_page(&query, 0, 5).await;

        assert!(
            matches!(result, Err(SearchError::RateLimited { .. })),
            "Expected RateLimited, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn test_fetch_page_maps_server_error_to_http_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let provider = GoogleSearch::with_base_url(&mock_server.uri()).unwrap();
        let query = SearchQuery::new("anything", 5, "en");
        let result = provider.fetch_page(&query, 0, 5).await;

        assert!(
            matches!(result, Err(SearchError::HttpStatus { status: 503, .. })),
            "Expected HttpStatus 503, got: {result:?}"
        );
    }
}
