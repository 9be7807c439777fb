//! Session cookie store shared by every request the client makes.
//!
//! `reqwest::cookie::Jar` cannot be enumerated, and the session needs to
//! look cookies up by name (`_xsrf`) and write them back to disk, so the
//! client plugs this store in through `ClientBuilder::cookie_provider()`.

use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{CookieError, CookieLine, parse_netscape_cookies, write_netscape_cookies};

/// In-memory cookie store with Netscape-file persistence.
#[derive(Debug, Default)]
pub struct SessionCookieStore {
    cookies: RwLock<Vec<CookieLine>>,
}

impl SessionCookieStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with cookies.
    #[must_use]
    pub fn with_cookies(cookies: Vec<CookieLine>) -> Self {
        let store = Self::new();
        store.extend(cookies);
        store
    }

    /// Inserts cookies, replacing any with the same domain, path and name.
    pub fn extend(&self, cookies: impl IntoIterator<Item = CookieLine>) {
        let now = unix_now();
        let Ok(mut guard) = self.cookies.write() else {
            return;
        };
        for cookie in cookies {
            guard.retain(|existing| !existing.same_slot(&cookie));
            if !cookie.is_expired(now) {
                guard.push(cookie);
            }
        }
    }

    /// Returns the value of the first live cookie named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let now = unix_now();
        self.cookies.read().ok().and_then(|guard| {
            guard
                .iter()
                .find(|cookie| cookie.name == name && !cookie.is_expired(now))
                .map(|cookie| cookie.value().to_string())
        })
    }

    /// Returns a snapshot of all live cookies.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CookieLine> {
        let now = unix_now();
        self.cookies
            .read()
            .map(|guard| {
                guard
                    .iter()
                    .filter(|cookie| !cookie.is_expired(now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of live cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the store holds no live cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cookie.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.cookies.write() {
            guard.clear();
        }
    }

    /// Loads a cookie file into the store.
    ///
    /// Returns `Ok(false)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError`] when the file cannot be read or holds no
    /// valid cookie lines.
    #[instrument(level = "debug", skip(self), fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> Result<bool, CookieError> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("cookie file not found");
                return Ok(false);
            }
            Err(error) => return Err(error.into()),
        };

        let parsed = parse_netscape_cookies(BufReader::new(file))?;
        for (line, reason) in &parsed.warnings {
            warn!(line, reason = %reason, "skipping malformed cookie line");
        }
        debug!(count = parsed.cookies.len(), "loaded cookies from file");
        self.extend(parsed.cookies);
        Ok(true)
    }

    /// Writes every live cookie, session cookies included, to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::Io`] when the file cannot be written.
    #[instrument(level = "debug", skip(self), fields(path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result<(), CookieError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let cookies = self.snapshot();
        let file = fs::File::create(path)?;
        write_netscape_cookies(BufWriter::new(file), &cookies)?;
        set_owner_only_permissions(path)?;
        debug!(count = cookies.len(), "saved cookies to file");
        Ok(())
    }
}

impl CookieStore for SessionCookieStore {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let parsed: Vec<CookieLine> = cookie_headers
            .filter_map(|header| header.to_str().ok())
            .filter_map(|raw| parse_set_cookie(raw, url, unix_now()))
            .collect();
        if parsed.is_empty() {
            return;
        }

        let now = unix_now();
        let Ok(mut guard) = self.cookies.write() else {
            return;
        };
        for cookie in parsed {
            guard.retain(|existing| !existing.same_slot(&cookie));
            // An already-expired Set-Cookie is the server deleting the slot
            if !cookie.is_expired(now) {
                guard.push(cookie);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let host = url.host_str()?;
        let is_https = url.scheme() == "https";
        let now = unix_now();

        let guard = self.cookies.read().ok()?;
        let pairs: Vec<String> = guard
            .iter()
            .filter(|cookie| !cookie.is_expired(now))
            .filter(|cookie| cookie.matches_host(host) && cookie.matches_path(url.path()))
            .filter(|cookie| is_https || !cookie.secure)
            .map(|cookie| format!("{}={}", cookie.name, cookie.value()))
            .collect();

        if pairs.is_empty() {
            return None;
        }
        HeaderValue::from_str(&pairs.join("; ")).ok()
    }
}

/// Parses one `Set-Cookie` header value received from `url`.
fn parse_set_cookie(raw: &str, url: &Url, now: u64) -> Option<CookieLine> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches('"');

    let host = url.host_str()?;
    let mut domain = None;
    let mut path = None;
    let mut secure = false;
    let mut expires = None;
    let mut max_age = None;

    for attribute in parts {
        let (key, attr_value) = match attribute.split_once('=') {
            Some((key, attr_value)) => (key.trim(), attr_value.trim()),
            None => (attribute.trim(), ""),
        };
        match key.to_ascii_lowercase().as_str() {
            "domain" if !attr_value.is_empty() => {
                domain = Some(attr_value.trim_start_matches('.').to_ascii_lowercase());
            }
            "path" if attr_value.starts_with('/') => path = Some(attr_value.to_string()),
            "secure" => secure = true,
            "expires" => {
                expires = httpdate::parse_http_date(attr_value)
                    .ok()
                    .map(|time| system_time_to_unix(time).max(1));
            }
            "max-age" => max_age = attr_value.parse::<i64>().ok(),
            _ => {}
        }
    }

    // Max-Age wins over Expires; a non-positive Max-Age deletes the cookie.
    let expires = match max_age {
        Some(seconds) if seconds <= 0 => 1,
        Some(seconds) => now.saturating_add(seconds.unsigned_abs()),
        None => expires.unwrap_or(0),
    };

    let (domain, tailmatch) = match domain {
        Some(domain) => {
            let host_lower = host.to_ascii_lowercase();
            if host_lower == domain {
                (host.to_string(), false)
            } else if !domain.contains('.') {
                warn!(cookie = name, %domain, %host, "rejecting cookie for top-level domain");
                return None;
            } else if !host_lower.ends_with(&format!(".{domain}")) {
                warn!(cookie = name, %domain, %host, "rejecting cookie for foreign domain");
                return None;
            } else {
                (format!(".{domain}"), true)
            }
        }
        None => (host.to_string(), false),
    };

    Some(CookieLine::new(
        domain,
        tailmatch,
        path.unwrap_or_else(|| default_path(url)),
        secure,
        expires,
        name.to_string(),
        value.to_string(),
    ))
}

/// RFC 6265 default-path: the request path up to, not including, its last `/`.
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

fn system_time_to_unix(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

pub(crate) fn unix_now() -> u64 {
    system_time_to_unix(SystemTime::now())
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), CookieError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), CookieError> {
    Ok(())
}
