//! Browser identity presented to the site.
//!
//! The sign-in API rejects obvious non-browser clients, so every session
//! request carries a desktop Chrome User-Agent and the site's own Referer.
//! `Accept-Encoding` (gzip, deflate, br) is added by reqwest so it can decode
//! what it advertises.

use reqwest::header::{HeaderMap, HeaderValue, REFERER};

/// Desktop Chrome User-Agent sent with every session request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/66.0.3359.181 Safari/537.36";

/// Referer sent with every session request.
pub const SITE_REFERER: &str = "https://www.zhihu.com/";

/// Headers attached to every request made through the session.
#[must_use]
pub(crate) fn default_session_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(REFERER, HeaderValue::from_static(SITE_REFERER));
    headers
}
