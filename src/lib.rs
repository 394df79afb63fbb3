//! PDF Harvest Library
//!
//! Finds PDF documents published on one web domain through a web search,
//! keeps only links that point at PDFs on that domain, and downloads each
//! one sequentially into a local folder.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Run parameters and their validation
//! - [`search`] - Search providers and the lazy, bounded result stream
//! - [`filter`] - PDF/domain link filtering and de-duplication
//! - [`download`] - Streaming HTTP downloads with filename derivation
//! - [`pipeline`] - Orchestration of search, filter and download stages

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod filter;
pub mod pipeline;
pub mod search;
pub mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, HarvestConfig};
pub use download::{DownloadError, DownloadSession, FailureKind, download_pdf};
pub use filter::{PdfLinkSet, Rejection, check_link, collect_pdf_links};
pub use pipeline::{HarvestError, HarvestEvent, HarvestReport, download_all, harvest};
pub use search::{GoogleSearch, SearchError, SearchProvider, SearchQuery, run_query};
