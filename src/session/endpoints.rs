//! Site URLs used by the session.

use url::Url;

use crate::error::ClientError;
use crate::login::CaptchaLang;

/// Main site origin.
pub const DEFAULT_WWW_BASE: &str = "https://www.zhihu.com";
/// Column (zhuanlan) site origin.
pub const DEFAULT_ZHUANLAN_BASE: &str = "https://zhuanlan.zhihu.com";

/// Origins the client talks to.
///
/// Overridable so the whole flow can run against a mirror or mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    www: String,
    zhuanlan: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            www: DEFAULT_WWW_BASE.to_string(),
            zhuanlan: DEFAULT_ZHUANLAN_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Creates endpoints from two origins.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnexpectedResponse`] naming the origin when it
    /// is not an absolute http(s) URL.
    pub fn new(www: &str, zhuanlan: &str) -> Result<Self, ClientError> {
        Ok(Self {
            www: normalize_origin(www)?,
            zhuanlan: normalize_origin(zhuanlan)?,
        })
    }

    /// Points both origins at one server.
    ///
    /// # Errors
    ///
    /// Same as [`Endpoints::new`].
    pub fn single(base: &str) -> Result<Self, ClientError> {
        Self::new(base, base)
    }

    /// Home page; visiting it sets `_xsrf`.
    #[must_use]
    pub fn home(&self) -> String {
        format!("{}/", self.www)
    }

    /// Sign-up page; redirects away once logged in.
    #[must_use]
    pub fn signup(&self) -> String {
        format!("{}/signup", self.www)
    }

    /// Password sign-in API.
    #[must_use]
    pub fn sign_in(&self) -> String {
        format!("{}/api/v3/oauth/sign_in", self.www)
    }

    /// Captcha API for a language.
    #[must_use]
    pub fn captcha(&self, lang: CaptchaLang) -> String {
        format!("{}/api/v3/oauth/captcha?lang={}", self.www, lang.as_str())
    }

    /// Profile of the logged-in account.
    #[must_use]
    pub fn me(&self) -> String {
        format!("{}/api/me", self.zhuanlan)
    }

    /// JSON API v4 resource path, e.g. `answers/123`.
    #[must_use]
    pub fn api_v4(&self, path: &str) -> String {
        format!("{}/api/v4/{}", self.www, path.trim_start_matches('/'))
    }
}

fn normalize_origin(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
            Ok(trimmed.to_string())
        }
        _ => Err(ClientError::unexpected(raw, "not an absolute http(s) origin")),
    }
}
