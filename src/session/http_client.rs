//! HTTP client construction policy for the session.
//!
//! Every client shares the session cookie store, the browser headers and
//! the configured timeouts. The session keeps two flavours per route: one
//! that follows redirects and one that does not, since the login probes
//! read the redirect itself.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use super::ProxyRoute;
use crate::auth::SessionCookieStore;
use crate::error::ClientError;
use crate::user_agent::{BROWSER_USER_AGENT, default_session_headers};

/// Default connect timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default whole-request timeout in seconds.
pub const READ_TIMEOUT_SECS: u64 = 30;

/// Timeouts applied to every session request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Connect timeout in seconds.
    pub connect_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: CONNECT_TIMEOUT_SECS,
            read_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// A pair of clients bound to one proxy route (or none).
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    pub(crate) follow: Client,
    pub(crate) no_follow: Client,
}

impl Transport {
    pub(crate) fn build(
        cookies: &Arc<SessionCookieStore>,
        timeouts: HttpTimeouts,
        route: Option<&ProxyRoute>,
    ) -> Result<Self, ClientError> {
        let proxies = match route {
            Some(route) => route.to_reqwest()?,
            None => Vec::new(),
        };
        Ok(Self {
            follow: build_client(cookies, timeouts, &proxies, true)?,
            no_follow: build_client(cookies, timeouts, &proxies, false)?,
        })
    }

    pub(crate) fn client(&self, follow_redirects: bool) -> &Client {
        if follow_redirects {
            &self.follow
        } else {
            &self.no_follow
        }
    }
}

fn build_client(
    cookies: &Arc<SessionCookieStore>,
    timeouts: HttpTimeouts,
    proxies: &[Proxy],
    follow_redirects: bool,
) -> Result<Client, ClientError> {
    match try_build_client(cookies, timeouts, proxies, follow_redirects, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed macOS environments panic when querying system
            // proxy settings; env proxies still apply on the fallback path.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(cookies, timeouts, proxies, follow_redirects, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(ClientError::ClientBuild {
                    reason: "client construction panicked while reading proxy settings"
                        .to_string(),
                }),
                Err(BuildClientFailure::Build(error)) => Err(ClientError::ClientBuild {
                    reason: error.to_string(),
                }),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(ClientError::ClientBuild {
            reason: error.to_string(),
        }),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    cookies: &Arc<SessionCookieStore>,
    timeouts: HttpTimeouts,
    proxies: &[Proxy],
    follow_redirects: bool,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    let cookies = Arc::clone(cookies);
    let proxies = proxies.to_vec();
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(cookies, timeouts, follow_redirects);
        let explicit_proxy = !proxies.is_empty();
        for proxy in proxies {
            builder = builder.proxy(proxy);
        }
        if disable_system_proxy_lookup && !explicit_proxy {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(
    cookies: Arc<SessionCookieStore>,
    timeouts: HttpTimeouts,
    follow_redirects: bool,
) -> ClientBuilder {
    let redirect = if follow_redirects {
        Policy::limited(10)
    } else {
        Policy::none()
    };
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.read_secs))
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(default_session_headers())
        .cookie_provider(cookies)
        .redirect(redirect)
        .gzip(true)
        .deflate(true)
        .brotli(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
