//! Download session and the per-URL streaming download.
//!
//! [`DownloadSession`] owns the HTTP client for one harvest run. It is built
//! once, passed by reference to every [`download_pdf`] call and released when
//! dropped at the end of the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{CONTENT_DISPOSITION, HeaderMap, HeaderValue, USER_AGENT};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::WRITE_BUFFER_BYTES;
use super::error::DownloadError;
use super::filename::derive_filename;
use crate::config::HarvestConfig;
use crate::user_agent;

/// HTTP session shared by every download in a run.
///
/// Carries the default headers (browser User-Agent), the per-request
/// timeout and the TLS validation choice.
#[derive(Debug)]
pub struct DownloadSession {
    client: Client,
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl DownloadSession {
    /// Builds a session with the given connect/read timeout.
    ///
    /// When `accept_invalid_certs` is true, TLS certificates are not
    /// validated and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the client cannot be built.
    #[instrument(level = "debug")]
    pub fn new(timeout: Duration, accept_invalid_certs: bool) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(user_agent::default_download_user_agent()),
        );

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .gzip(true)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        if accept_invalid_certs {
            warn!("TLS certificate validation is disabled for downloads");
        }
        debug!(timeout_secs = timeout.as_secs_f64(), "download session opened");

        Ok(Self {
            client,
            timeout,
            accept_invalid_certs,
        })
    }

    /// Builds a session from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the client cannot be built.
    pub fn from_config(config: &HarvestConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.request_timeout, config.accept_invalid_certs)
    }

    /// Connect/read timeout applied to every request.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether TLS certificate validation is skipped.
    #[must_use]
    pub fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }
}

impl Drop for DownloadSession {
    fn drop(&mut self) {
        debug!("download session closed");
    }
}

/// Downloads one PDF into `folder` and returns the written path.
///
/// Creates `folder` (with parents) when missing, streams the body to disk
/// chunk by chunk and removes the partial file if streaming fails. An
/// existing file with the same name is overwritten.
///
/// # Errors
///
/// Returns [`DownloadError`] for folder creation, network, HTTP status,
/// timeout and file write failures. The caller decides whether to continue.
#[instrument(skip(session, folder), fields(url = %url))]
pub async fn download_pdf(
    session: &DownloadSession,
    url: &str,
    folder: &Path,
) -> Result<PathBuf, DownloadError> {
    ensure_folder(folder).await?;

    let parsed_url = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

    let response = session
        .client
        .get(parsed_url.clone())
        .send()
        .await
        .map_err(|e| DownloadError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::http_status(url, status.as_u16()));
    }

    let content_disposition = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok());
    let filename = derive_filename(&parsed_url, content_disposition);
    let file_path = folder.join(&filename);
    info!(filename = %filename, "starting download");

    let mut file = File::create(&file_path)
        .await
        .map_err(|e| DownloadError::processing(url, &file_path, e))?;

    match stream_to_file(&mut file, response, url, &file_path).await {
        Ok(bytes) => {
            info!(path = %file_path.display(), bytes, "download complete");
            Ok(file_path)
        }
        Err(error) => {
            drop(file);
            debug!(path = %file_path.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(&file_path).await;
            Err(error)
        }
    }
}

async fn ensure_folder(folder: &Path) -> Result<(), DownloadError> {
    let is_dir = tokio::fs::metadata(folder)
        .await
        .is_ok_and(|meta| meta.is_dir());
    if is_dir {
        return Ok(());
    }

    tokio::fs::create_dir_all(folder)
        .await
        .map_err(|e| DownloadError::filesystem(folder, e))?;
    info!(folder = %folder.display(), "created folder");
    Ok(())
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_BYTES, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::from_reqwest(url, e))?;
        if chunk.is_empty() {
            continue;
        }

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::processing(url, file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::processing(url, file_path, e))?;

    Ok(bytes_written)
}
