//! Seeding a session from a browser cookie export.
//!
//! Logging in through the browser and exporting its cookies skips the
//! captcha round trip entirely. Two export shapes are accepted:
//! the Netscape cookie file and the JSON arrays written by the common
//! "cookie editor" extensions (bare array or `{ "cookies": [...] }`).

use std::io::BufReader;

use serde::Deserialize;
use tracing::{debug, instrument};

use super::store::unix_now;
use super::{CookieError, CookieLine, parse_netscape_cookies};

/// Export format detected in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Netscape HTTP Cookie File format.
    Netscape,
    /// JSON export format.
    Json,
}

impl ExportFormat {
    /// Stable label for log output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Netscape => "netscape",
            Self::Json => "json",
        }
    }
}

/// Cookies accepted from a browser export.
#[derive(Debug)]
pub struct ImportedCookies {
    /// Live cookies belonging to the requested site.
    pub cookies: Vec<CookieLine>,
    /// Non-fatal problems with individual entries.
    pub warnings: Vec<String>,
    /// Entries dropped because they belong to another site.
    pub foreign: usize,
    /// Input format that was parsed.
    pub format: ExportFormat,
}

/// Errors that can occur while importing a browser export.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Input was empty.
    #[error("cookie input is empty")]
    EmptyInput,
    /// Netscape-format parser failed.
    #[error(transparent)]
    Netscape(#[from] CookieError),
    /// JSON parser failed.
    #[error("invalid cookie JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Nothing usable for the site remained.
    #[error("no live cookies for {site} found in the export")]
    NoSiteCookies {
        /// Registrable domain that was searched for.
        site: String,
    },
}

/// Parses a browser export and keeps the live cookies scoped to `site`
/// (e.g. `zhihu.com`, which also admits `www.zhihu.com`).
///
/// # Errors
///
/// Returns [`ImportError`] when the input is empty, cannot be parsed, or
/// holds no live cookie for `site`.
#[instrument(level = "debug", skip(input))]
pub fn import_browser_cookies(input: &str, site: &str) -> Result<ImportedCookies, ImportError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ImportError::EmptyInput);
    }

    let (cookies, mut warnings, format) = if trimmed.starts_with('[') || trimmed.starts_with('{')
    {
        let (cookies, warnings) = parse_json_export(trimmed)?;
        (cookies, warnings, ExportFormat::Json)
    } else {
        let parsed = parse_netscape_cookies(BufReader::new(trimmed.as_bytes()))?;
        let warnings = parsed
            .warnings
            .iter()
            .map(|(line, reason)| format!("line {line}: {reason}"))
            .collect();
        (parsed.cookies, warnings, ExportFormat::Netscape)
    };

    let total = cookies.len();
    let site_cookies: Vec<CookieLine> = cookies
        .into_iter()
        .filter(|cookie| belongs_to_site(cookie, site))
        .collect();
    let foreign = total - site_cookies.len();

    let (live, expiry_warnings) = drop_unusable(site_cookies, unix_now());
    warnings.extend(expiry_warnings);
    debug!(kept = live.len(), foreign, "filtered browser export");

    if live.is_empty() {
        return Err(ImportError::NoSiteCookies {
            site: site.to_string(),
        });
    }

    Ok(ImportedCookies {
        cookies: live,
        warnings,
        foreign,
        format,
    })
}

fn belongs_to_site(cookie: &CookieLine, site: &str) -> bool {
    let domain = cookie.domain.trim_start_matches('.').to_ascii_lowercase();
    let site = site.trim_start_matches('.').to_ascii_lowercase();
    domain == site || domain.ends_with(&format!(".{site}"))
}

fn drop_unusable(cookies: Vec<CookieLine>, now: u64) -> (Vec<CookieLine>, Vec<String>) {
    let mut live = Vec::new();
    let mut warnings = Vec::new();

    for mut cookie in cookies {
        if cookie.value().is_empty() {
            warnings.push(format!("skipped cookie '{}' with empty value", cookie.name));
            continue;
        }
        if cookie.is_expired(now) {
            warnings.push(format!("skipped expired cookie '{}'", cookie.name));
            continue;
        }
        if cookie.path.trim().is_empty() {
            cookie.path = "/".to_string();
        }
        live.push(cookie);
    }

    (live, warnings)
}

fn parse_json_export(input: &str) -> Result<(Vec<CookieLine>, Vec<String>), ImportError> {
    let entries = match serde_json::from_str::<JsonExport>(input)? {
        JsonExport::Array(entries) | JsonExport::Wrapped { cookies: entries } => entries,
    };

    let mut cookies = Vec::new();
    let mut warnings = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        match entry.into_cookie_line() {
            Ok(cookie) => cookies.push(cookie),
            Err(reason) => warnings.push(format!("entry {}: {reason}", index + 1)),
        }
    }
    Ok((cookies, warnings))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonExport {
    Array(Vec<JsonCookie>),
    Wrapped { cookies: Vec<JsonCookie> },
}

#[derive(Debug, Deserialize)]
struct JsonCookie {
    domain: Option<String>,
    #[serde(rename = "hostOnly")]
    host_only: Option<bool>,
    path: Option<String>,
    secure: Option<bool>,
    name: Option<String>,
    value: Option<String>,
    #[serde(rename = "expirationDate", alias = "expires")]
    expiration_date: Option<f64>,
}

impl JsonCookie {
    fn into_cookie_line(self) -> Result<CookieLine, String> {
        let raw_domain = self.domain.unwrap_or_default();
        let raw_domain = raw_domain.trim();
        if raw_domain.is_empty() {
            return Err("missing required field: domain".to_string());
        }
        let name = self.name.unwrap_or_default().trim().to_string();
        if name.is_empty() {
            return Err("missing required field: name".to_string());
        }

        let tailmatch = self.host_only.map_or(raw_domain.starts_with('.'), |host_only| !host_only);
        let bare = raw_domain.trim_start_matches('.');
        let domain = if tailmatch {
            format!(".{bare}")
        } else {
            bare.to_string()
        };

        let path = match self.path {
            Some(path) if path.starts_with('/') => path,
            Some(path) if !path.trim().is_empty() => format!("/{path}"),
            _ => "/".to_string(),
        };

        let expires = self
            .expiration_date
            .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
            .map_or(0, |seconds| {
                // expirationDate carries fractional seconds
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let whole = seconds.floor() as u64;
                whole.max(1)
            });

        Ok(CookieLine::new(
            domain,
            tailmatch,
            path,
            self.secure.unwrap_or(false),
            expires,
            name,
            self.value.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_netscape_keeps_only_site_cookies() {
        let input = "\
# Netscape HTTP Cookie File
.zhihu.com\tTRUE\t/\tTRUE\t4102444800\tz_c0\ttoken
www.zhihu.com\tFALSE\t/\tFALSE\t0\t_xsrf\tx
.example.com\tTRUE\t/\tFALSE\t0\tsession\tother
";
        let imported = import_browser_cookies(input, "zhihu.com").unwrap();
        assert_eq!(imported.format, ExportFormat::Netscape);
        assert_eq!(imported.cookies.len(), 2);
        assert_eq!(imported.foreign, 1);
    }

    #[test]
    fn test_import_json_array_export() {
        let input = r#"
[
  {"domain": ".zhihu.com", "name": "z_c0", "value": "token", "path": "/",
   "secure": true, "expirationDate": 4102444800.25},
  {"domain": "www.zhihu.com", "hostOnly": true, "name": "_xsrf", "value": "x"}
]
"#;
        let imported = import_browser_cookies(input, "zhihu.com").unwrap();
        assert_eq!(imported.format, ExportFormat::Json);
        assert_eq!(imported.cookies.len(), 2);
        assert_eq!(imported.cookies[0].expires, 4_102_444_800);
        assert!(imported.cookies[0].tailmatch);
        assert_eq!(imported.cookies[1].domain, "www.zhihu.com");
        assert!(!imported.cookies[1].tailmatch);
    }

    #[test]
    fn test_import_json_wrapped_export_with_bad_entry() {
        let input = r#"{"cookies": [
            {"domain": ".zhihu.com", "name": "", "value": "v"},
            {"domain": ".zhihu.com", "name": "d_c0", "value": "v", "path": "api"}
        ]}"#;
        let imported = import_browser_cookies(input, "zhihu.com").unwrap();
        assert_eq!(imported.cookies.len(), 1);
        assert_eq!(imported.cookies[0].path, "/api");
        assert_eq!(imported.warnings.len(), 1);
    }

    #[test]
    fn test_import_only_expired_or_foreign_fails() {
        let input = "\
.zhihu.com\tTRUE\t/\tFALSE\t1\tz_c0\told
.example.com\tTRUE\t/\tFALSE\t0\tsession\tother
";
        let err = import_browser_cookies(input, "zhihu.com").unwrap_err();
        assert!(matches!(err, ImportError::NoSiteCookies { .. }));
    }

    #[test]
    fn test_import_empty_input_fails() {
        assert!(matches!(
            import_browser_cookies("  \n", "zhihu.com"),
            Err(ImportError::EmptyInput)
        ));
    }

    #[test]
    fn test_belongs_to_site_does_not_match_lookalikes() {
        let cookie = CookieLine::new(
            ".notzhihu.com".to_string(),
            true,
            "/".to_string(),
            false,
            0,
            "n".to_string(),
            "v".to_string(),
        );
        assert!(!belongs_to_site(&cookie, "zhihu.com"));
    }
}
