//! Error types for session and login operations.
//!
//! A failed login is not an error: [`ZhihuClient::login`](crate::ZhihuClient::login)
//! reports it as `Ok(false)`. These variants cover everything that stops the
//! flow from running at all.

use std::path::PathBuf;

use thiserror::Error;

use crate::auth::CookieError;
use crate::resource::ResourceError;

/// Errors raised by [`ZhihuClient`](crate::ZhihuClient) and its session.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network-level error (DNS, connection refused, TLS, timeout).
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The site answered with a status the operation cannot use.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response from {url}: {reason}")]
    UnexpectedResponse {
        /// The URL whose response was malformed.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild {
        /// Why construction failed.
        reason: String,
    },

    /// A proxy URL was rejected.
    #[error("invalid proxy '{proxy}': {reason}\n  Suggestion: use the form http://host:port")]
    InvalidProxy {
        /// The proxy as given.
        proxy: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The home page did not set an `_xsrf` cookie.
    #[error(
        "no _xsrf cookie after visiting {url}\n  Suggestion: the sign-in page layout may have changed; retry later"
    )]
    XsrfNotFound {
        /// The page that was expected to set the cookie.
        url: String,
    },

    /// The captcha API returned a payload that could not be decoded.
    #[error("captcha challenge unusable: {reason}")]
    Captcha {
        /// What was wrong with the challenge or the answer.
        reason: String,
    },

    /// The sign-in form could not be encrypted.
    #[error("form encryption failed: {reason}\n  Suggestion: check that node is installed and the encrypt script path is correct")]
    Encrypt {
        /// Why the encryptor failed.
        reason: String,
    },

    /// Reading user input failed.
    #[error("could not read {what} from the terminal: {source}")]
    Prompt {
        /// Which value was being asked for.
        what: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// File system error on a local session file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Cookie file error.
    #[error(transparent)]
    Cookie(#[from] CookieError),

    /// Resource URL or payload error.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl ClientError {
    /// Creates a network error, folding timeouts into the same variant.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an unexpected-response error.
    pub fn unexpected(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a captcha error.
    pub fn captcha(reason: impl Into<String>) -> Self {
        Self::Captcha {
            reason: reason.into(),
        }
    }

    /// Creates an encryption error.
    pub fn encrypt(reason: impl Into<String>) -> Self {
        Self::Encrypt {
            reason: reason.into(),
        }
    }

    /// Creates a file I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error came from the network layer rather than local state.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::HttpStatus { .. })
    }
}
