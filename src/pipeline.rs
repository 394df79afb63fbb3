//! The harvest pipeline: search, filter, then download one link at a time.
//!
//! Nothing past configuration validation fails the run. Search failures
//! yield an empty link set and per-URL download failures are logged, counted
//! and skipped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::{ConfigError, HarvestConfig};
use crate::download::{DownloadError, DownloadSession, FailureKind, download_pdf};
use crate::filter::{PdfLinkSet, collect_pdf_links};
use crate::search::{SearchProvider, run_query};

/// Progress notifications emitted while a harvest runs.
#[derive(Debug)]
pub enum HarvestEvent<'a> {
    /// Filtering finished with `count` unique PDF links.
    LinksCollected {
        /// Number of unique links about to be downloaded.
        count: usize,
    },
    /// A download is about to start (`index` is 1-based).
    Attempt {
        /// Position of this link in the run.
        index: usize,
        /// Number of links in the run.
        total: usize,
        /// The link being downloaded.
        url: &'a str,
    },
    /// A link was written to disk.
    Saved {
        /// The downloaded link.
        url: &'a str,
        /// Where it was written.
        path: &'a Path,
    },
    /// A link failed; the run continues.
    Failed {
        /// The failed link.
        url: &'a str,
        /// Why it failed.
        error: &'a DownloadError,
    },
}

/// Aggregate result of a harvest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    /// Links a download was attempted for.
    pub attempted: usize,
    /// Links fully written to disk.
    pub succeeded: usize,
    /// Absolute path of the destination folder.
    pub folder: PathBuf,
}

impl HarvestReport {
    /// Links whose download failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// Errors that stop a harvest before any download starts.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client for downloads could not be built.
    #[error("failed to open download session: {0}")]
    Session(#[source] reqwest::Error),
}

/// Runs the whole pipeline: query `provider`, keep PDF links on the target
/// domain, download each once, and report the totals.
///
/// `on_event` receives progress notifications in order.
///
/// # Errors
///
/// Returns [`HarvestError`] only for invalid configuration or when the
/// download session cannot be opened.
#[instrument(skip_all, fields(query = %config.query, domain = %config.target_domain))]
pub async fn harvest<F>(
    config: &HarvestConfig,
    provider: &dyn SearchProvider,
    mut on_event: F,
) -> Result<HarvestReport, HarvestError>
where
    F: FnMut(HarvestEvent<'_>),
{
    config.validate()?;

    let query = config.search_query();
    let links = collect_pdf_links(run_query(provider, &query), &config.target_domain).await;
    info!(count = links.len(), "collected unique PDF links");
    on_event(HarvestEvent::LinksCollected { count: links.len() });

    let session = DownloadSession::from_config(config).map_err(HarvestError::Session)?;
    let report = download_all(
        &session,
        &links,
        &config.download_folder,
        config.download_interval,
        &mut on_event,
    )
    .await;
    drop(session);

    Ok(report)
}

/// Downloads every link in `links` once, in set order, pausing `interval`
/// after each attempt.
pub async fn download_all<F>(
    session: &DownloadSession,
    links: &PdfLinkSet,
    folder: &Path,
    interval: Duration,
    on_event: &mut F,
) -> HarvestReport
where
    F: FnMut(HarvestEvent<'_>),
{
    let total = links.len();
    let mut succeeded = 0;

    for (position, url) in links.iter().enumerate() {
        on_event(HarvestEvent::Attempt {
            index: position + 1,
            total,
            url,
        });

        match download_pdf(session, url, folder).await {
            Ok(path) => {
                succeeded += 1;
                on_event(HarvestEvent::Saved { url, path: &path });
            }
            Err(error) => {
                log_failure(url, &error, session.accepts_invalid_certs());
                on_event(HarvestEvent::Failed { url, error: &error });
            }
        }

        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }

    let folder = std::path::absolute(folder).unwrap_or_else(|_| folder.to_path_buf());
    info!(
        attempted = total,
        succeeded,
        failed = total - succeeded,
        folder = %folder.display(),
        "download run finished"
    );

    HarvestReport {
        attempted: total,
        succeeded,
        folder,
    }
}

fn log_failure(url: &str, error: &DownloadError, accepts_invalid_certs: bool) {
    match error.kind() {
        FailureKind::Timeout => warn!(url = %url, "download timed out"),
        FailureKind::Network => {
            warn!(url = %url, error = %error, "download failed");
            if error.is_tls_related() {
                if accepts_invalid_certs {
                    warn!(
                        url = %url,
                        "failure looks TLS related although certificate validation is already disabled"
                    );
                } else {
                    warn!(
                        url = %url,
                        "failure looks TLS related; the site may need accept_invalid_certs"
                    );
                }
            }
        }
        FailureKind::Processing => {
            warn!(url = %url, error = %error, "unknown error while processing or saving file");
        }
        FailureKind::Filesystem => {
            warn!(url = %url, error = %error, "could not create download folder");
        }
    }
}
