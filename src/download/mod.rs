//! Streaming PDF downloads.
//!
//! This module fetches one URL at a time through a shared
//! [`DownloadSession`] and writes the body to disk.
//!
//! # Features
//!
//! - Streaming downloads (bounded memory regardless of file size)
//! - Filename from URL path, then `Content-Disposition`, then a timestamp
//! - Filename sanitization to alphanumerics plus `.`, `_`, `-`
//! - Destination folder created on demand
//! - Structured errors classified by [`FailureKind`]
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use pdf_harvest::download::{DownloadSession, download_pdf};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = DownloadSession::new(Duration::from_secs(60), false)?;
//! let file_path = download_pdf(&session, "https://example.com/paper.pdf", Path::new("./pdfs")).await?;
//! println!("Downloaded: {}", file_path.display());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod filename;

pub use client::{DownloadSession, download_pdf};
pub use error::{DownloadError, FailureKind};
pub use filename::{
    GENERATED_NAME_PREFIX, derive_filename, filename_from_content_disposition, filename_from_url,
    generated_filename, has_pdf_extension, raw_filename, sanitize_filename,
};
