//! Netscape cookie file format: the on-disk shape of a persisted session.
//!
//! Each data line holds 7 TAB-separated fields:
//! `domain`, `tailmatch`, `path`, `secure`, `expires`, `name`, `value`.

use std::fmt;
use std::io::{BufRead, Write};

use tracing::{debug, instrument, warn};

/// Header line written at the top of every saved cookie file.
pub const NETSCAPE_HEADER: &str = "# Netscape HTTP Cookie File";

/// A single session cookie.
///
/// The value field is redacted in Debug output so session tokens never reach
/// the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct CookieLine {
    /// The domain the cookie belongs to (e.g., `.zhihu.com`).
    pub domain: String,
    /// Whether subdomains should match.
    pub tailmatch: bool,
    /// The URL path scope for the cookie.
    pub path: String,
    /// Whether the cookie should only be sent over HTTPS.
    pub secure: bool,
    /// Unix timestamp for expiry (0 = session cookie).
    pub expires: u64,
    /// Cookie name.
    pub name: String,
    value: String,
}

impl CookieLine {
    /// Creates a new cookie entry.
    #[must_use]
    pub fn new(
        domain: String,
        tailmatch: bool,
        path: String,
        secure: bool,
        expires: u64,
        name: String,
        value: String,
    ) -> Self {
        Self {
            domain,
            tailmatch,
            path,
            secure,
            expires,
            name,
            value,
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive, avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the cookie has a fixed expiry that lies at or before `now`.
    #[must_use]
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires != 0 && self.expires <= now
    }

    /// Whether this cookie applies to requests for `host`.
    #[must_use]
    pub fn matches_host(&self, host: &str) -> bool {
        let domain = self.domain.strip_prefix('.').unwrap_or(&self.domain);
        if host.eq_ignore_ascii_case(domain) {
            return true;
        }
        self.tailmatch
            && host.len() > domain.len()
            && host
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", domain.to_ascii_lowercase()))
    }

    /// Whether this cookie applies to requests for `request_path`.
    #[must_use]
    pub fn matches_path(&self, request_path: &str) -> bool {
        if self.path.is_empty() || self.path == "/" {
            return true;
        }
        match request_path.strip_prefix(self.path.as_str()) {
            Some(rest) => self.path.ends_with('/') || rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Whether two cookies occupy the same slot (domain, path and name).
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        self.name == other.name
            && self.path == other.path
            && self
                .domain
                .trim_start_matches('.')
                .eq_ignore_ascii_case(other.domain.trim_start_matches('.'))
    }

    fn to_netscape_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.domain,
            bool_field(self.tailmatch),
            if self.path.is_empty() { "/" } else { &self.path },
            bool_field(self.secure),
            self.expires,
            self.name,
            self.value
        )
    }
}

impl fmt::Debug for CookieLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieLine")
            .field("domain", &self.domain)
            .field("tailmatch", &self.tailmatch)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Errors that can occur while reading or writing a cookie file.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// A line in the cookie file has an invalid format.
    #[error("line {line_number}: {reason} (got: {content})")]
    InvalidLine {
        /// 1-based line number in the cookie file.
        line_number: usize,
        /// The offending line content (with value redacted).
        content: String,
        /// Description of what was wrong.
        reason: String,
    },

    /// I/O error reading or writing the cookie file.
    #[error("cookie file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// No valid cookies found in a non-empty file.
    #[error("no valid cookies found in file ({malformed_count} lines failed to parse)")]
    NoCookiesFound {
        /// Number of malformed lines encountered.
        malformed_count: usize,
    },
}

/// Result of parsing a cookie file.
#[derive(Debug)]
pub struct ParseResult {
    /// Successfully parsed cookies.
    pub cookies: Vec<CookieLine>,
    /// Warnings for malformed lines (line number and reason).
    pub warnings: Vec<(usize, String)>,
}

/// Parses a Netscape-format cookie file from a buffered reader.
///
/// Lines starting with `#` and blank lines are skipped. Malformed lines are
/// collected as warnings so one bad line does not discard a whole session.
///
/// # Errors
///
/// Returns [`CookieError::Io`] on read failure, or
/// [`CookieError::NoCookiesFound`] when a non-empty file yields zero valid cookies.
#[instrument(level = "debug", skip(reader))]
pub fn parse_netscape_cookies(reader: impl BufRead) -> Result<ParseResult, CookieError> {
    let mut cookies = Vec::new();
    let mut warnings = Vec::new();
    let mut non_blank_lines = 0;

    for (idx, line_result) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let line = line_result?;
        let line = line.trim_end_matches(['\r', '\n']);

        if line.trim().is_empty() {
            continue;
        }

        // curl writes HttpOnly cookies with this prefix; they are data, not comments
        let (line, http_only) = match line.strip_prefix("#HttpOnly_") {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        if !http_only && line.starts_with('#') {
            continue;
        }

        non_blank_lines += 1;

        match parse_cookie_line(line, line_number) {
            Ok(cookie) => {
                debug!(
                    line = line_number,
                    domain = %cookie.domain,
                    name = %cookie.name,
                    "parsed cookie"
                );
                cookies.push(cookie);
            }
            Err(e) => {
                warn!(line = line_number, reason = %e, "skipping malformed cookie line");
                warnings.push((line_number, e.to_string()));
            }
        }
    }

    if cookies.is_empty() && non_blank_lines > 0 {
        return Err(CookieError::NoCookiesFound {
            malformed_count: warnings.len(),
        });
    }

    Ok(ParseResult { cookies, warnings })
}

/// Writes cookies in Netscape format, header first.
///
/// # Errors
///
/// Returns [`CookieError::Io`] when the writer fails.
pub fn write_netscape_cookies(
    mut writer: impl Write,
    cookies: &[CookieLine],
) -> Result<(), CookieError> {
    writeln!(writer, "{NETSCAPE_HEADER}")?;
    for cookie in cookies {
        writeln!(writer, "{}", cookie.to_netscape_line())?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_cookie_line(line: &str, line_number: usize) -> Result<CookieLine, CookieError> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() != 7 {
        return Err(CookieError::InvalidLine {
            line_number,
            content: redact_line_for_error(line),
            reason: format!("expected 7 TAB-separated fields, found {}", fields.len()),
        });
    }

    let domain = fields[0].to_string();
    let tailmatch = parse_bool_field(fields[1], "tailmatch", line_number, line)?;
    let path = fields[2].to_string();
    let secure = parse_bool_field(fields[3], "secure", line_number, line)?;

    let expires = fields[4]
        .parse::<u64>()
        .map_err(|_| CookieError::InvalidLine {
            line_number,
            content: redact_line_for_error(line),
            reason: format!(
                "expires field must be a non-negative integer, got '{}'",
                fields[4]
            ),
        })?;

    let name = fields[5].to_string();
    let value = fields[6].to_string();

    if domain.is_empty() {
        return Err(CookieError::InvalidLine {
            line_number,
            content: redact_line_for_error(line),
            reason: "domain field is empty".to_string(),
        });
    }

    if name.is_empty() {
        return Err(CookieError::InvalidLine {
            line_number,
            content: redact_line_for_error(line),
            reason: "cookie name field is empty".to_string(),
        });
    }

    Ok(CookieLine::new(
        domain, tailmatch, path, secure, expires, name, value,
    ))
}

fn parse_bool_field(
    value: &str,
    field_name: &str,
    line_number: usize,
    line: &str,
) -> Result<bool, CookieError> {
    match value.to_ascii_uppercase().as_str() {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        _ => Err(CookieError::InvalidLine {
            line_number,
            content: redact_line_for_error(line),
            reason: format!("{field_name} field must be TRUE or FALSE, got '{value}'"),
        }),
    }
}

fn bool_field(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

/// Redacts the cookie value (7th field) from a line for error messages.
fn redact_line_for_error(line: &str) -> String {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() >= 7 {
        let mut redacted = fields[..6].join("\t");
        redacted.push_str("\t[REDACTED]");
        redacted
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn cursor(s: &str) -> Cursor<&[u8]> {
        Cursor::new(s.as_bytes())
    }

    fn zhihu_cookie(name: &str, value: &str) -> CookieLine {
        CookieLine::new(
            ".zhihu.com".to_string(),
            true,
            "/".to_string(),
            false,
            0,
            name.to_string(),
            value.to_string(),
        )
    }

    #[test]
    fn test_parse_netscape_cookies_valid_file() {
        let input = "\
# Netscape HTTP Cookie File
.zhihu.com\tTRUE\t/\tFALSE\t0\t_xsrf\tabc123
www.zhihu.com\tFALSE\t/api\tTRUE\t1700000000\tz_c0\txyz789
";
        let result = parse_netscape_cookies(cursor(input)).unwrap();
        assert_eq!(result.cookies.len(), 2);
        assert!(result.warnings.is_empty());

        assert_eq!(result.cookies[0].domain, ".zhihu.com");
        assert!(result.cookies[0].tailmatch);
        assert_eq!(result.cookies[0].name, "_xsrf");
        assert_eq!(result.cookies[0].value(), "abc123");

        assert!(!result.cookies[1].tailmatch);
        assert!(result.cookies[1].secure);
        assert_eq!(result.cookies[1].path, "/api");
        assert_eq!(result.cookies[1].expires, 1_700_000_000);
    }

    #[test]
    fn test_parse_netscape_cookies_http_only_prefix_is_data() {
        let input = "#HttpOnly_.zhihu.com\tTRUE\t/\tTRUE\t0\tz_c0\ttoken\n";
        let result = parse_netscape_cookies(cursor(input)).unwrap();
        assert_eq!(result.cookies.len(), 1);
        assert_eq!(result.cookies[0].domain, ".zhihu.com");
    }

    #[test]
    fn test_parse_netscape_cookies_malformed_lines_with_line_numbers() {
        let input = "\
# Header
.zhihu.com\tTRUE\t/\tFALSE\t0\tname\tvalue
bad line without tabs
.zhihu.com\tTRUE\t/\tFALSE\t0\tother\tval
";
        let result = parse_netscape_cookies(cursor(input)).unwrap();
        assert_eq!(result.cookies.len(), 2);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].0, 3);
        assert!(
            result.warnings[0]
                .1
                .contains("expected 7 TAB-separated fields")
        );
    }

    #[test]
    fn test_parse_netscape_cookies_empty_file() {
        let result = parse_netscape_cookies(cursor("")).unwrap();
        assert!(result.cookies.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_parse_netscape_cookies_all_malformed_returns_error() {
        let input = "bad line one\nanother bad line\n";
        let err = parse_netscape_cookies(cursor(input)).unwrap_err();
        assert!(
            matches!(err, CookieError::NoCookiesFound { malformed_count: 2 }),
            "expected NoCookiesFound with 2 malformed, got: {err}"
        );
    }

    #[test]
    fn test_parse_netscape_cookies_invalid_fields_rejected() {
        for input in [
            ".zhihu.com\tYES\t/\tFALSE\t0\tname\tvalue\n",
            ".zhihu.com\tTRUE\t/\tFALSE\tsoon\tname\tvalue\n",
            "\tTRUE\t/\tFALSE\t0\tname\tvalue\n",
            ".zhihu.com\tTRUE\t/\tFALSE\t0\t\tvalue\n",
        ] {
            assert!(
                parse_netscape_cookies(cursor(input)).is_err(),
                "should reject: {input:?}"
            );
        }
    }

    #[test]
    fn test_parse_netscape_cookies_crlf_line_endings() {
        let input = "# Header\r\n.zhihu.com\tTRUE\t/\tFALSE\t0\tname\tvalue\r\n";
        let result = parse_netscape_cookies(cursor(input)).unwrap();
        assert_eq!(result.cookies[0].value(), "value");
    }

    #[test]
    fn test_write_then_parse_preserves_session() {
        let cookies = vec![zhihu_cookie("_xsrf", "x1"), zhihu_cookie("z_c0", "token")];
        let mut buffer = Vec::new();
        write_netscape_cookies(&mut buffer, &cookies).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with(NETSCAPE_HEADER));

        let parsed = parse_netscape_cookies(cursor(&text)).unwrap();
        assert_eq!(parsed.cookies, cookies);
    }

    #[test]
    fn test_cookie_line_debug_redacts_value() {
        let cookie = zhihu_cookie("z_c0", "super_secret_token");
        let debug_str = format!("{cookie:?}");
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("super_secret_token"));
    }

    #[test]
    fn test_redact_line_for_error_hides_value() {
        let redacted = redact_line_for_error(".zhihu.com\tTRUE\t/\tFALSE\t0\tname\tsecret_value");
        assert!(!redacted.contains("secret_value"));
        assert!(redacted.contains("[REDACTED]"));
    }

    #[test]
    fn test_matches_host_tailmatch() {
        let cookie = zhihu_cookie("n", "v");
        assert!(cookie.matches_host("zhihu.com"));
        assert!(cookie.matches_host("www.zhihu.com"));
        assert!(cookie.matches_host("zhuanlan.zhihu.com"));
        assert!(!cookie.matches_host("notzhihu.com"));
        assert!(!cookie.matches_host("example.com"));
    }

    #[test]
    fn test_matches_host_exact_only_without_tailmatch() {
        let mut cookie = zhihu_cookie("n", "v");
        cookie.domain = "www.zhihu.com".to_string();
        cookie.tailmatch = false;
        assert!(cookie.matches_host("www.zhihu.com"));
        assert!(!cookie.matches_host("api.www.zhihu.com"));
    }

    #[test]
    fn test_matches_path_prefix_boundaries() {
        let mut cookie = zhihu_cookie("n", "v");
        cookie.path = "/api".to_string();
        assert!(cookie.matches_path("/api"));
        assert!(cookie.matches_path("/api/v4/answers/1"));
        assert!(!cookie.matches_path("/apiv2"));
        assert!(!cookie.matches_path("/signup"));
    }

    #[test]
    fn test_is_expired() {
        let mut cookie = zhihu_cookie("n", "v");
        assert!(!cookie.is_expired(u64::MAX), "session cookies never expire");
        cookie.expires = 100;
        assert!(cookie.is_expired(100));
        assert!(!cookie.is_expired(99));
    }
}
