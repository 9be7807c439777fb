//! The HTTP session shared by the client and every wrapper it creates.
//!
//! A [`Session`] is a cheap handle: clones share the cookie store and the
//! proxy routing, so changing the proxy on the client also reroutes the
//! answers, questions and columns it has already handed out.

mod endpoints;
mod http_client;
mod proxy;

pub use endpoints::{DEFAULT_WWW_BASE, DEFAULT_ZHUANLAN_BASE, Endpoints};
pub use http_client::{CONNECT_TIMEOUT_SECS, HttpTimeouts, READ_TIMEOUT_SECS};
pub use proxy::{ProxyAuth, ProxyRoute};

use std::fmt;
use std::sync::{Arc, RwLock};

use rand::seq::SliceRandom;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::auth::SessionCookieStore;
use crate::error::ClientError;
use http_client::Transport;

/// Shared HTTP session: cookies, headers, timeouts and proxy routing.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    cookies: Arc<SessionCookieStore>,
    endpoints: Endpoints,
    timeouts: HttpTimeouts,
    routing: RwLock<Routing>,
}

struct Routing {
    base: Transport,
    base_route: Option<ProxyRoute>,
    pool: Option<Vec<Transport>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoints", &self.inner.endpoints)
            .field("timeouts", &self.inner.timeouts)
            .field("cookies", &self.inner.cookies.len())
            .field("proxy_pool", &self.proxy_pool_size())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session with an empty cookie store and no proxy.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ClientBuild`] when the HTTP client cannot be built.
    pub fn new(endpoints: Endpoints, timeouts: HttpTimeouts) -> Result<Self, ClientError> {
        let cookies = Arc::new(SessionCookieStore::new());
        let base = Transport::build(&cookies, timeouts, None)?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                cookies,
                endpoints,
                timeouts,
                routing: RwLock::new(Routing {
                    base,
                    base_route: None,
                    pool: None,
                }),
            }),
        })
    }

    /// The session cookie store.
    #[must_use]
    pub fn cookies(&self) -> &SessionCookieStore {
        &self.inner.cookies
    }

    /// Origins this session talks to.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    /// Routes all traffic through one proxy, or directly with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidProxy`] or [`ClientError::ClientBuild`]
    /// when the route cannot be applied; the previous routing stays in place.
    #[instrument(level = "debug", skip(self))]
    pub fn set_proxy(&self, route: Option<ProxyRoute>) -> Result<(), ClientError> {
        let base = Transport::build(&self.inner.cookies, self.inner.timeouts, route.as_ref())?;
        let mut routing = self.write_routing()?;
        routing.base = base;
        routing.base_route = route;
        Ok(())
    }

    /// Picks a random proxy from `routes` for every request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidProxy`] when `routes` is empty or one of
    /// them cannot be applied.
    #[instrument(level = "debug", skip(self, routes), fields(count = routes.len()))]
    pub fn set_proxy_pool(&self, routes: &[ProxyRoute]) -> Result<(), ClientError> {
        if routes.is_empty() {
            return Err(ClientError::InvalidProxy {
                proxy: String::new(),
                reason: "proxy pool is empty".to_string(),
            });
        }
        let pool = routes
            .iter()
            .map(|route| Transport::build(&self.inner.cookies, self.inner.timeouts, Some(route)))
            .collect::<Result<Vec<_>, _>>()?;
        self.write_routing()?.pool = Some(pool);
        Ok(())
    }

    /// Drops the proxy pool; traffic goes back to the single route.
    pub fn remove_proxy_pool(&self) {
        if let Ok(mut routing) = self.inner.routing.write() {
            routing.pool = None;
        }
    }

    /// Number of proxies in the pool, if one is set.
    #[must_use]
    pub fn proxy_pool_size(&self) -> Option<usize> {
        self.inner
            .routing
            .read()
            .ok()
            .and_then(|routing| routing.pool.as_ref().map(Vec::len))
    }

    /// The single proxy route, if one is set.
    #[must_use]
    pub fn proxy(&self) -> Option<ProxyRoute> {
        self.inner
            .routing
            .read()
            .ok()
            .and_then(|routing| routing.base_route.clone())
    }

    /// Starts a request on the current route.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ClientBuild`] when the routing lock is poisoned.
    pub fn request(
        &self,
        method: Method,
        url: &str,
        follow_redirects: bool,
    ) -> Result<RequestBuilder, ClientError> {
        let routing = self
            .inner
            .routing
            .read()
            .map_err(|_| ClientError::ClientBuild {
                reason: "session routing lock poisoned".to_string(),
            })?;
        let transport = match routing.pool.as_deref() {
            Some(pool) => pool
                .choose(&mut rand::thread_rng())
                .unwrap_or(&routing.base),
            None => &routing.base,
        };
        Ok(transport.client(follow_redirects).request(method, url))
    }

    /// Sends a prepared request, mapping transport failures.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] when the request cannot complete.
    pub async fn send(&self, builder: RequestBuilder, url: &str) -> Result<Response, ClientError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::network(url, e))?;
        debug!(url, status = response.status().as_u16(), "response received");
        Ok(response)
    }

    /// GETs `url` following redirects and returns the body of a 2xx response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] or [`ClientError::HttpStatus`].
    #[instrument(level = "debug", skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String, ClientError> {
        let response = self.send(self.request(Method::GET, url, true)?, url).await?;
        read_success_text(response, url).await
    }

    /// GETs `url` and decodes a 2xx JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnexpectedResponse`] when the body is not the
    /// expected JSON, plus the errors of [`Session::get_text`].
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| ClientError::unexpected(url, e.to_string()))
    }

    fn write_routing(&self) -> Result<std::sync::RwLockWriteGuard<'_, Routing>, ClientError> {
        self.inner
            .routing
            .write()
            .map_err(|_| ClientError::ClientBuild {
                reason: "session routing lock poisoned".to_string(),
            })
    }
}

/// Reads the body of a response that must be 2xx.
pub(crate) async fn read_success_text(response: Response, url: &str) -> Result<String, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::http_status(url, status.as_u16()));
    }
    response
        .text()
        .await
        .map_err(|e| ClientError::network(url, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_pool_set_and_remove() {
        let session = Session::new(Endpoints::default(), HttpTimeouts::default()).unwrap();
        assert_eq!(session.proxy_pool_size(), None);

        let routes = vec![
            ProxyRoute::new("10.0.0.1:8080").unwrap(),
            ProxyRoute::new("10.0.0.2:8080").unwrap(),
        ];
        session.set_proxy_pool(&routes).unwrap();
        assert_eq!(session.proxy_pool_size(), Some(2));
        assert!(session.request(Method::GET, "https://www.zhihu.com/", true).is_ok());

        session.remove_proxy_pool();
        assert_eq!(session.proxy_pool_size(), None);
    }

    #[test]
    fn test_empty_proxy_pool_rejected() {
        let session = Session::new(Endpoints::default(), HttpTimeouts::default()).unwrap();
        assert!(matches!(
            session.set_proxy_pool(&[]),
            Err(ClientError::InvalidProxy { .. })
        ));
    }

    #[test]
    fn test_set_proxy_is_visible_through_clones() {
        let session = Session::new(Endpoints::default(), HttpTimeouts::default()).unwrap();
        let handle = session.clone();
        session
            .set_proxy(Some(ProxyRoute::new("10.0.0.1:8080").unwrap()))
            .unwrap();
        assert_eq!(
            handle.proxy().map(|route| route.url),
            Some("http://10.0.0.1:8080".to_string())
        );
        session.set_proxy(None).unwrap();
        assert!(handle.proxy().is_none());
    }

    #[test]
    fn test_clones_share_cookie_store() {
        let session = Session::new(Endpoints::default(), HttpTimeouts::default()).unwrap();
        let handle = session.clone();
        session.cookies().extend([crate::auth::CookieLine::new(
            ".zhihu.com".to_string(),
            true,
            "/".to_string(),
            false,
            0,
            "_xsrf".to_string(),
            "x".to_string(),
        )]);
        assert_eq!(handle.cookies().get("_xsrf").as_deref(), Some("x"));
    }
}
