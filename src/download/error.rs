//! Error types for the download module.
//!
//! Every per-URL failure is one of these values. None of them abort a run;
//! the pipeline logs them and counts the URL as failed.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while downloading a single PDF.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The destination folder could not be created.
    #[error("failed to create folder {path}: {source}")]
    Filesystem {
        /// Folder that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Connecting or reading the body took longer than the session timeout.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error response (any non-2xx status).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Creating or writing the output file failed.
    #[error("error saving {url} to {path}: {source}")]
    Processing {
        /// The URL being saved.
        url: String,
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Coarse failure classes reported per URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request timed out.
    Timeout,
    /// Connection, TLS or HTTP status failure.
    Network,
    /// Filename derivation or disk write failure.
    Processing,
    /// Destination folder creation failure.
    Filesystem,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Processing => "processing",
            Self::Filesystem => "filesystem",
        };
        f.write_str(label)
    }
}

impl DownloadError {
    /// Creates a folder-creation error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Maps a reqwest error to [`Self::Timeout`] or [`Self::Network`].
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a file write error.
    pub fn processing(
        url: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Processing {
            url: url.into(),
            path: path.into(),
            source,
        }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Filesystem { .. } => FailureKind::Filesystem,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Network { .. } | Self::HttpStatus { .. } => FailureKind::Network,
            Self::InvalidUrl { .. } | Self::Processing { .. } => FailureKind::Processing,
        }
    }

    /// Returns true when a network failure looks like a TLS or certificate problem.
    #[must_use]
    pub fn is_tls_related(&self) -> bool {
        match self {
            Self::Network { source, .. } => chain_mentions_tls(source),
            _ => false,
        }
    }
}

const TLS_MARKERS: [&str; 4] = ["certificate", "tls", "ssl", "handshake"];

fn chain_mentions_tls(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        let message = err.to_string().to_lowercase();
        if TLS_MARKERS.iter().any(|marker| message.contains(marker)) {
            return true;
        }
        current = err.source();
    }
    false
}
