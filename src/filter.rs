//! Link filter: keeps direct PDF links on the target domain.
//!
//! The check is URL-based only. Pages are never fetched or inspected.

use std::collections::BTreeSet;
use std::fmt;

use futures_util::{Stream, StreamExt};
use tracing::{debug, info};
use url::Url;

/// Why a candidate URL was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The string is not an absolute URL.
    Unparseable,
    /// The decoded path does not end in `.pdf`.
    NotPdf,
    /// The host does not contain the target domain.
    WrongDomain,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Unparseable => "not a valid URL",
            Self::NotPdf => "not a direct PDF link",
            Self::WrongDomain => "not on the target site",
        };
        f.write_str(reason)
    }
}

/// Checks one candidate URL against the PDF and domain rules.
///
/// # Errors
///
/// Returns the first [`Rejection`] the URL trips.
pub fn check_link(candidate: &str, target_domain: &str) -> Result<(), Rejection> {
    let parsed = Url::parse(candidate).map_err(|_| Rejection::Unparseable)?;

    let decoded = urlencoding::decode(parsed.path()).unwrap_or_else(|_| parsed.path().into());
    if !decoded.to_lowercase().ends_with(".pdf") {
        return Err(Rejection::NotPdf);
    }

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    if !host.contains(&target_domain.to_lowercase()) {
        return Err(Rejection::WrongDomain);
    }

    Ok(())
}

/// Unique PDF links that passed [`check_link`].
///
/// Ordered, so iteration is stable across runs with the same input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfLinkSet {
    links: BTreeSet<String>,
}

impl PdfLinkSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unique links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns true when no link survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Returns true if `url` is in the set.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.links.contains(url)
    }

    /// Iterates links in stable order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(String::as_str)
    }

    /// Adds `candidate` if it passes the rules; returns whether it was newly added.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] when the link fails the rules.
    pub fn offer(&mut self, candidate: &str, target_domain: &str) -> Result<bool, Rejection> {
        check_link(candidate, target_domain)?;
        Ok(self.links.insert(candidate.to_string()))
    }
}

/// Drains the candidate stream into a [`PdfLinkSet`], logging every decision.
pub async fn collect_pdf_links<S>(candidates: S, target_domain: &str) -> PdfLinkSet
where
    S: Stream<Item = String>,
{
    let mut set = PdfLinkSet::new();
    let mut candidates = std::pin::pin!(candidates);

    while let Some(candidate) = candidates.next().await {
        match set.offer(&candidate, target_domain) {
            Ok(true) => info!(url = %candidate, "found PDF link"),
            Ok(false) => debug!(url = %candidate, "duplicate PDF link"),
            Err(reason) => info!(url = %candidate, %reason, "ignoring link"),
        }
    }

    set
}
