//! Run configuration for a harvest.
//!
//! The program has no command-line flags; every tunable lives here with the
//! fixed defaults the binary runs with. Tests build their own values.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::search::SearchQuery;

/// Search query issued by the binary.
pub const DEFAULT_SEARCH_QUERY: &str = "filetype:pdf site:columbiasports.cn";

/// Host substring every downloaded URL must contain.
pub const DEFAULT_TARGET_DOMAIN: &str = "columbiasports.cn";

/// Destination folder, relative to the working directory.
pub const DEFAULT_DOWNLOAD_FOLDER: &str = "columbia_sportswear_pdfs";

/// Requested number of search results (the provider may return fewer).
pub const DEFAULT_MAX_RESULTS: usize = 150;

/// Language hint passed to the search provider.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Timeout applied to connecting and to each body read.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Pause after every attempted download.
pub const DEFAULT_DOWNLOAD_INTERVAL: Duration = Duration::from_millis(1500);

/// Errors raised by [`HarvestConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The search query is empty or whitespace.
    #[error("search query must not be empty")]
    EmptyQuery,

    /// The target domain is empty or whitespace.
    #[error("target domain must not be empty")]
    EmptyDomain,

    /// A zero result count was requested.
    #[error("max_results must be at least 1")]
    ZeroResults,

    /// A zero request timeout was configured.
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Everything a single harvest run needs to know.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Query string submitted to the search provider.
    pub query: String,
    /// Host substring a result must contain to be downloaded.
    pub target_domain: String,
    /// Folder the PDFs are written to.
    pub download_folder: PathBuf,
    /// Requested number of search results.
    pub max_results: usize,
    /// Language hint for the search provider.
    pub language: String,
    /// Per-request timeout for downloads.
    pub request_timeout: Duration,
    /// Pause after each attempted download.
    pub download_interval: Duration,
    /// Skip TLS certificate validation for downloads.
    ///
    /// Enabled by default: the target site serves a certificate chain that
    /// does not validate. This is a trust decision, so the session logs a
    /// warning whenever it is on.
    pub accept_invalid_certs: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            query: DEFAULT_SEARCH_QUERY.to_string(),
            target_domain: DEFAULT_TARGET_DOMAIN.to_string(),
            download_folder: PathBuf::from(DEFAULT_DOWNLOAD_FOLDER),
            max_results: DEFAULT_MAX_RESULTS,
            language: DEFAULT_LANGUAGE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            download_interval: DEFAULT_DOWNLOAD_INTERVAL,
            accept_invalid_certs: true,
        }
    }
}

impl HarvestConfig {
    /// Checks the constraints the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query.trim().is_empty() {
            return Err(ConfigError::EmptyQuery);
        }
        if self.target_domain.trim().is_empty() {
            return Err(ConfigError::EmptyDomain);
        }
        if self.max_results == 0 {
            return Err(ConfigError::ZeroResults);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Builds the search query described by this configuration.
    #[must_use]
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery::new(&self.query, self.max_results, &self.language)
    }
}
