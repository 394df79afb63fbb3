//! Error types for the search stage.

use thiserror::Error;

/// Errors a [`SearchProvider`](super::SearchProvider) can report.
///
/// None of these escape [`run_query`](super::run_query); they are logged and
/// end the result stream.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Transport-level failure talking to the provider.
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider throttled or blocked the client.
    #[error("rate limited by search provider {provider}")]
    RateLimited {
        /// Provider name.
        provider: String,
    },

    /// The provider answered with a non-success status.
    #[error("search provider {provider} returned HTTP {status}")]
    HttpStatus {
        /// Provider name.
        provider: String,
        /// HTTP status code.
        status: u16,
    },

    /// The provider endpoint could not be parsed.
    #[error("invalid search endpoint: {url}")]
    InvalidEndpoint {
        /// The endpoint string.
        url: String,
    },
}
