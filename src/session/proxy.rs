//! Proxy routes for session traffic.

use std::fmt;

use reqwest::Proxy;
use url::Url;

use crate::error::ClientError;

/// Basic credentials for an authenticating proxy.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyAuth {
    /// Proxy user name.
    pub username: String,
    password: String,
}

impl ProxyAuth {
    /// Creates proxy credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for ProxyAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyAuth")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// One proxy and the traffic it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    /// Proxy URL, e.g. `http://10.0.0.1:8080`.
    pub url: String,
    /// Whether https traffic goes through the proxy too.
    pub https: bool,
    /// Optional proxy credentials.
    pub auth: Option<ProxyAuth>,
}

impl ProxyRoute {
    /// Routes all traffic through `proxy`.
    ///
    /// Bare `host:port` entries are read as `http://host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidProxy`] when the proxy is not a valid URL.
    pub fn new(proxy: &str) -> Result<Self, ClientError> {
        Ok(Self {
            url: normalize_proxy_url(proxy)?,
            https: true,
            auth: None,
        })
    }

    /// Sets whether https traffic is proxied.
    #[must_use]
    pub fn with_https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Attaches proxy credentials.
    #[must_use]
    pub fn with_auth(mut self, auth: Option<ProxyAuth>) -> Self {
        self.auth = auth;
        self
    }

    /// Builds the reqwest proxies for this route.
    pub(crate) fn to_reqwest(&self) -> Result<Vec<Proxy>, ClientError> {
        let invalid = |error: reqwest::Error| ClientError::InvalidProxy {
            proxy: self.url.clone(),
            reason: error.to_string(),
        };

        let mut proxies = vec![Proxy::http(&self.url).map_err(invalid)?];
        if self.https {
            proxies.push(Proxy::https(&self.url).map_err(invalid)?);
        }
        Ok(proxies
            .into_iter()
            .map(|proxy| match &self.auth {
                Some(auth) => proxy.basic_auth(&auth.username, &auth.password),
                None => proxy,
            })
            .collect())
    }
}

fn normalize_proxy_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidProxy {
            proxy: raw.to_string(),
            reason: "proxy is empty".to_string(),
        });
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    match Url::parse(&candidate) {
        Ok(url) if url.host_str().is_some() => Ok(candidate),
        Ok(_) => Err(ClientError::InvalidProxy {
            proxy: raw.to_string(),
            reason: "proxy has no host".to_string(),
        }),
        Err(error) => Err(ClientError::InvalidProxy {
            proxy: raw.to_string(),
            reason: error.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_port_gets_http_scheme() {
        let route = ProxyRoute::new("10.0.0.1:8080").unwrap();
        assert_eq!(route.url, "http://10.0.0.1:8080");
        assert!(route.https);
    }

    #[test]
    fn test_explicit_scheme_kept() {
        let route = ProxyRoute::new("socks5://127.0.0.1:1080").unwrap();
        assert_eq!(route.url, "socks5://127.0.0.1:1080");
    }

    #[test]
    fn test_invalid_proxies_rejected() {
        assert!(matches!(
            ProxyRoute::new("  "),
            Err(ClientError::InvalidProxy { .. })
        ));
        assert!(ProxyRoute::new("http://").is_err());
    }

    #[test]
    fn test_http_only_route_builds_one_proxy() {
        let route = ProxyRoute::new("http://10.0.0.1:8080")
            .unwrap()
            .with_https(false);
        assert_eq!(route.to_reqwest().unwrap().len(), 1);

        let route = route.with_https(true);
        assert_eq!(route.to_reqwest().unwrap().len(), 2);
    }

    #[test]
    fn test_proxy_auth_debug_redacts_password() {
        let auth = ProxyAuth::new("laike9m", "123456");
        let debug = format!("{auth:?}");
        assert!(debug.contains("laike9m"));
        assert!(!debug.contains("123456"));
    }
}
