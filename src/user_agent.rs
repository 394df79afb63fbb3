//! Shared User-Agent strings for search and download HTTP clients.

/// Browser User-Agent sent with every download request.
///
/// The target site rejects clients that identify as tools, so downloads look
/// like a desktop browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Text-browser User-Agent sent to the search provider.
///
/// Text browsers get the plain HTML results page with `/url?q=` redirect
/// links instead of the script-rendered one.
pub const TEXT_BROWSER_USER_AGENT: &str = "Lynx/2.9.0 libwww-FM/2.14 SSL-MM/1.4.1 OpenSSL/3.0.2";

/// User-Agent installed as a default header on the download session.
#[must_use]
pub(crate) fn default_download_user_agent() -> &'static str {
    BROWSER_USER_AGENT
}

/// User-Agent used for search result page requests.
#[must_use]
pub(crate) fn default_search_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{TEXT_BROWSER_USER_AGENT} pdf-harvest/{version}")
}
