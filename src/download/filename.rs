//! Filename derivation and sanitization for downloaded PDFs.
//!
//! Preference order: the URL's last path segment, then the
//! `Content-Disposition` filename, then a millisecond timestamp name. Only
//! candidates ending in `.pdf` are accepted from the first two sources.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;
use url::Url;

const PDF_EXTENSION: &str = ".pdf";

/// Prefix of names generated when neither the URL nor the headers offer one.
pub const GENERATED_NAME_PREFIX: &str = "downloaded_pdf_";

/// Returns true if `name` ends in `.pdf`, ignoring ASCII case.
#[must_use]
pub fn has_pdf_extension(name: &str) -> bool {
    name.len() >= PDF_EXTENSION.len()
        && name
            .get(name.len() - PDF_EXTENSION.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(PDF_EXTENSION))
}

/// Last segment of the percent-decoded URL path, if it names a PDF.
#[must_use]
pub fn filename_from_url(url: &Url) -> Option<String> {
    let decoded = urlencoding::decode(url.path()).unwrap_or_else(|e| {
        debug!(path = url.path(), error = %e, "URL path decoding failed, using raw path");
        url.path().into()
    });
    let last = decoded.rsplit('/').next().unwrap_or_default();
    (!last.is_empty() && has_pdf_extension(last)).then(|| last.to_string())
}

/// `Content-Disposition` filename, percent-decoded, if it names a PDF.
#[must_use]
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let raw = parse_content_disposition(header)?;
    let decoded = urlencoding::decode(&raw).map_or(raw.clone(), |name| name.into_owned());
    (!decoded.is_empty() && has_pdf_extension(&decoded)).then_some(decoded)
}

/// Parses Content-Disposition header to extract the raw filename token.
///
/// Handles both:
/// - `attachment; filename="example.pdf"`
/// - `attachment; filename=example.pdf`
/// - `attachment; filename*=UTF-8''example.pdf` (RFC 5987)
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + "filename*=".len()..].trim();
        // charset'language'encoded_value
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            let encoded_name = encoded[..end].trim();
            if !encoded_name.is_empty() {
                return Some(encoded_name.to_string());
            }
        }
    }

    if let Some(pos) = header.find("filename=") {
        let value = header[pos + "filename=".len()..].trim();

        if let Some(stripped) = value.strip_prefix('"') {
            // A missing closing quote keeps the rest of the header.
            let end = stripped.find('"').unwrap_or(stripped.len());
            let filename = &stripped[..end];
            if !filename.is_empty() {
                return Some(filename.to_string());
            }
        } else {
            let end = value.find(';').unwrap_or(value.len());
            let filename = value[..end].trim();
            if !filename.is_empty() {
                return Some(filename.to_string());
            }
        }
    }

    None
}

/// `downloaded_pdf_<unix millis>.pdf`.
#[must_use]
pub fn generated_filename() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{GENERATED_NAME_PREFIX}{millis}{PDF_EXTENSION}")
}

/// Picks the unsanitized filename candidate for a response.
#[must_use]
pub fn raw_filename(url: &Url, content_disposition: Option<&str>) -> String {
    if let Some(name) = filename_from_url(url) {
        return name;
    }
    if let Some(name) = content_disposition.and_then(filename_from_content_disposition) {
        debug!(filename = %name, "using Content-Disposition filename");
        return name;
    }
    let name = generated_filename();
    debug!(
        filename = %name,
        "no PDF filename in URL or response headers, using generated name"
    );
    name
}

/// Keeps only alphanumerics, `.`, `_` and `-`, then guarantees a `.pdf` suffix.
///
/// Idempotent: sanitizing an already sanitized name returns it unchanged.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if !has_pdf_extension(&cleaned) {
        cleaned.push_str(PDF_EXTENSION);
    }
    cleaned
}

/// Derives the on-disk filename for a response.
///
/// Falls back to a generated name when sanitizing leaves nothing but the extension.
#[must_use]
pub fn derive_filename(url: &Url, content_disposition: Option<&str>) -> String {
    let sanitized = sanitize_filename(&raw_filename(url, content_disposition));
    if sanitized.len() > PDF_EXTENSION.len() {
        sanitized
    } else {
        generated_filename()
    }
}
