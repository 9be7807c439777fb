//! The logged-in client: sign-in handshake, cookie persistence and the
//! resource factory.
//!
//! # Example
//!
//! ```no_run
//! use zhihu_client::{CaptchaLang, ZhihuClient};
//!
//! # async fn example() -> Result<(), zhihu_client::ClientError> {
//! let mut client = ZhihuClient::builder()
//!     .username("13800000000")
//!     .password("hunter2")
//!     .build()?;
//! if client.login(CaptchaLang::En, true).await? {
//!     let me = client.me().await?;
//!     println!("logged in as {}", me.name);
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::ClientError;
use crate::login::{
    CLIENT_ID, CaptchaChallenge, CaptchaLang, CaptchaViewer, Credentials, FormEncryptor,
    GRANT_TYPE, LoginForm, NodeEncryptor, Prompter, SOURCE, SystemViewer, TerminalPrompter,
    ZSE_83_VERSION, captcha_required, compute_signature, format_click_answer, normalize_username,
    parse_click_points,
};
use crate::resource::{
    Answer, Author, Collection, Column, Me, Post, Question, Resource, ResourceError, ResourceKind,
    Topic,
};
use crate::session::{Endpoints, HttpTimeouts, ProxyAuth, ProxyRoute, Session, read_success_text};

/// Default cookie file, relative to the working directory.
pub const DEFAULT_COOKIE_FILE: &str = "cookies.txt";
/// Default captcha image file, relative to the working directory.
pub const DEFAULT_CAPTCHA_FILE: &str = "captcha.jpg";
/// Default cipher script, relative to the working directory.
pub const DEFAULT_ENCRYPT_SCRIPT: &str = "encrypt.js";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const CLICK_CAPTCHA_ATTEMPTS: usize = 3;
const MAX_LOGGED_BODY_CHARS: usize = 200;

/// Builder for [`ZhihuClient`].
pub struct ZhihuClientBuilder {
    credentials: Credentials,
    cookie_file: PathBuf,
    captcha_file: PathBuf,
    endpoints: Endpoints,
    timeouts: HttpTimeouts,
    proxy: Option<ProxyRoute>,
    encryptor: Arc<dyn FormEncryptor>,
    prompter: Arc<dyn Prompter>,
    viewer: Arc<dyn CaptchaViewer>,
}

impl Default for ZhihuClientBuilder {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            cookie_file: PathBuf::from(DEFAULT_COOKIE_FILE),
            captcha_file: PathBuf::from(DEFAULT_CAPTCHA_FILE),
            endpoints: Endpoints::default(),
            timeouts: HttpTimeouts::default(),
            proxy: None,
            encryptor: Arc::new(NodeEncryptor::new(DEFAULT_ENCRYPT_SCRIPT)),
            prompter: Arc::new(TerminalPrompter),
            viewer: Arc::new(SystemViewer),
        }
    }
}

impl fmt::Debug for ZhihuClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZhihuClientBuilder")
            .field("credentials", &self.credentials)
            .field("cookie_file", &self.cookie_file)
            .field("captcha_file", &self.captcha_file)
            .field("endpoints", &self.endpoints)
            .field("timeouts", &self.timeouts)
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

impl ZhihuClientBuilder {
    /// Sets both credentials at once.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the username (phone number or email).
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.credentials.username = Some(username.into()).filter(|value| !value.is_empty());
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.credentials.set_password(password.into());
        self
    }

    /// Where session cookies are loaded from and saved to.
    #[must_use]
    pub fn cookie_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie_file = path.into();
        self
    }

    /// Where the captcha image is written.
    #[must_use]
    pub fn captcha_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.captcha_file = path.into();
        self
    }

    /// Site origins to talk to.
    #[must_use]
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Connect and request timeouts.
    #[must_use]
    pub fn timeouts(mut self, timeouts: HttpTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Routes all traffic through `proxy` from the start.
    #[must_use]
    pub fn proxy(mut self, proxy: ProxyRoute) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Cipher applied to the sign-in form.
    #[must_use]
    pub fn encryptor(mut self, encryptor: Arc<dyn FormEncryptor>) -> Self {
        self.encryptor = encryptor;
        self
    }

    /// Source of credentials and captcha answers.
    #[must_use]
    pub fn prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.prompter = prompter;
        self
    }

    /// How captcha images are shown.
    #[must_use]
    pub fn viewer(mut self, viewer: Arc<dyn CaptchaViewer>) -> Self {
        self.viewer = viewer;
        self
    }

    /// Builds the client and its session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ClientBuild`] or [`ClientError::InvalidProxy`]
    /// when the HTTP session cannot be set up.
    pub fn build(self) -> Result<ZhihuClient, ClientError> {
        let session = Session::new(self.endpoints, self.timeouts)?;
        if let Some(proxy) = self.proxy {
            session.set_proxy(Some(proxy))?;
        }
        Ok(ZhihuClient {
            session,
            credentials: self.credentials,
            cookie_file: self.cookie_file,
            captcha_file: self.captcha_file,
            encryptor: self.encryptor,
            prompter: self.prompter,
            viewer: self.viewer,
        })
    }
}

/// A session that can sign in and hands out resource wrappers.
pub struct ZhihuClient {
    session: Session,
    credentials: Credentials,
    cookie_file: PathBuf,
    captcha_file: PathBuf,
    encryptor: Arc<dyn FormEncryptor>,
    prompter: Arc<dyn Prompter>,
    viewer: Arc<dyn CaptchaViewer>,
}

impl fmt::Debug for ZhihuClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZhihuClient")
            .field("session", &self.session)
            .field("credentials", &self.credentials)
            .field("cookie_file", &self.cookie_file)
            .field("captcha_file", &self.captcha_file)
            .finish_non_exhaustive()
    }
}

macro_rules! typed_factory {
    ($(#[$doc:meta])* $method:ident, $wrapper:ident) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns [`ResourceError::InvalidUrl`] when the URL has another shape.
        pub fn $method(&self, url: &str) -> Result<$wrapper, ResourceError> {
            $wrapper::new(url, self.session.clone())
        }
    };
}

impl ZhihuClient {
    /// Starts a builder with the default files, endpoints and terminal I/O.
    #[must_use]
    pub fn builder() -> ZhihuClientBuilder {
        ZhihuClientBuilder::default()
    }

    /// The shared session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The credentials as currently known.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Cookie file path.
    #[must_use]
    pub fn cookie_file(&self) -> &Path {
        &self.cookie_file
    }

    /// Captcha image path.
    #[must_use]
    pub fn captcha_file(&self) -> &Path {
        &self.captcha_file
    }

    /// Signs in, reusing saved cookies when `load_cookies` is set and they
    /// are still valid.
    ///
    /// Returns `Ok(false)` when the site rejects the sign-in; the reason is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the handshake cannot run: network
    /// failure, missing `_xsrf`, unusable captcha, cipher or prompt failure.
    #[instrument(skip(self))]
    pub async fn login(&mut self, lang: CaptchaLang, load_cookies: bool) -> Result<bool, ClientError> {
        if load_cookies {
            match self.load_cookies() {
                Ok(true) => {
                    info!(path = %self.cookie_file.display(), "loaded cookies");
                    if self.check_login().await? {
                        info!("login succeeded");
                        return Ok(true);
                    }
                    info!("saved cookies expired; signing in again");
                }
                Ok(false) => debug!("no saved cookies"),
                Err(error) => warn!(%error, "could not load saved cookies; signing in again"),
            }
        }

        self.check_user_pass().await?;
        let username = self.credentials.username.clone().unwrap_or_default();
        let password = self.credentials.password().unwrap_or_default().to_string();

        let mut form = LoginForm::new(username, password, lang);
        form.timestamp = now_millis();
        form.captcha = self.get_captcha(lang).await?;
        let xsrf = self.get_xsrf().await?;
        let body = self.encryptor.encrypt(&form.to_urlencoded()).await?;

        let url = self.session.endpoints().sign_in();
        let request = self
            .session
            .request(Method::POST, &url, true)?
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header("x-zse-83", ZSE_83_VERSION)
            .header("x-xsrftoken", xsrf)
            .body(body);
        let response = self.session.send(request, &url).await?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::network(&url, e))?;

        if text.contains("error") {
            match sign_in_error_message(&text) {
                Some(message) => warn!(status, %message, "sign-in rejected"),
                None => warn!(
                    status,
                    body = %truncate_chars(&text, MAX_LOGGED_BODY_CHARS),
                    "sign-in response is not valid JSON"
                ),
            }
        }

        let logged_in = self.check_login().await?;
        if logged_in {
            info!("login succeeded");
        } else {
            warn!("login failed");
        }
        Ok(logged_in)
    }

    /// Loads the cookie file into the session.
    ///
    /// Returns `Ok(false)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cookie`] when the file is unreadable or holds
    /// no valid cookie.
    pub fn load_cookies(&self) -> Result<bool, ClientError> {
        Ok(self.session.cookies().load(&self.cookie_file)?)
    }

    /// Writes the session cookies to the cookie file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cookie`] when the file cannot be written.
    pub fn save_cookies(&self) -> Result<(), ClientError> {
        Ok(self.session.cookies().save(&self.cookie_file)?)
    }

    /// Forgets the session: clears the cookie store and deletes the cookie
    /// file. Returns whether a file was removed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when the file exists but cannot be removed.
    pub fn logout(&self) -> Result<bool, ClientError> {
        self.session.cookies().clear();
        match std::fs::remove_file(&self.cookie_file) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(ClientError::io(&self.cookie_file, error)),
        }
    }

    /// Probes the sign-up page: a redirect means the session is logged in.
    ///
    /// On success the cookies are saved; a failed save is logged and does
    /// not change the answer.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] when the probe cannot complete.
    #[instrument(level = "debug", skip(self))]
    pub async fn check_login(&self) -> Result<bool, ClientError> {
        let url = self.session.endpoints().signup();
        let response = self
            .session
            .send(self.session.request(Method::GET, &url, false)?, &url)
            .await?;
        if response.status() != StatusCode::FOUND {
            debug!(status = response.status().as_u16(), "not logged in");
            return Ok(false);
        }
        if let Err(error) = self.save_cookies() {
            warn!(%error, path = %self.cookie_file.display(), "could not save cookies");
        }
        Ok(true)
    }

    /// Visits the home page and returns the `_xsrf` cookie it sets.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::XsrfNotFound`] when the cookie is absent, or
    /// [`ClientError::Network`] when the page cannot be fetched.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_xsrf(&self) -> Result<String, ClientError> {
        let url = self.session.endpoints().home();
        self.session
            .send(self.session.request(Method::GET, &url, false)?, &url)
            .await?;
        self.session
            .cookies()
            .get("_xsrf")
            .ok_or(ClientError::XsrfNotFound { url })
    }

    /// Runs the captcha step and returns the answer, or `""` when the site
    /// does not ask for one.
    ///
    /// The probe is always sent: the sign-in API rejects forms whose session
    /// never asked.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Captcha`] on an unusable image or answer,
    /// [`ClientError::Io`] when the image cannot be written, and network or
    /// prompt errors.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_captcha(&self, lang: CaptchaLang) -> Result<String, ClientError> {
        let url = self.session.endpoints().captcha(lang);
        let probe = self.session.get_text(&url).await?;
        if !captcha_required(&probe) {
            debug!("no captcha required");
            return Ok(String::new());
        }

        info!("captcha required");
        let response = self
            .session
            .send(self.session.request(Method::PUT, &url, true)?, &url)
            .await?;
        let body = read_success_text(response, &url).await?;
        let challenge = CaptchaChallenge::from_response(&body).map_err(ClientError::captcha)?;
        tokio::fs::write(&self.captcha_file, &challenge.image)
            .await
            .map_err(|e| ClientError::io(&self.captcha_file, e))?;
        self.viewer.show(&self.captcha_file);

        let answer = match lang {
            CaptchaLang::En => {
                let message = format!(
                    "Enter the captcha shown in {}: ",
                    self.captcha_file.display()
                );
                self.ask("captcha", message).await?.trim().to_string()
            }
            CaptchaLang::Cn => self.ask_click_answer().await?,
        };

        let mut form = url::form_urlencoded::Serializer::new(String::new());
        form.append_pair("input_text", &answer);
        let request = self
            .session
            .request(Method::POST, &url, true)?
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form.finish());
        let response = self.session.send(request, &url).await?;
        if !response.status().is_success() {
            warn!(
                status = response.status().as_u16(),
                "captcha answer not accepted; sign-in will likely fail"
            );
        }
        Ok(answer)
    }

    /// Prompts for whichever of username and password is missing, then
    /// normalizes the username.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Prompt`] when input cannot be read or is empty.
    pub async fn check_user_pass(&mut self) -> Result<(), ClientError> {
        if self.credentials.username.is_none() {
            let username = self
                .ask("username", "Phone number or email: ".to_string())
                .await?;
            let username = username.trim();
            if username.is_empty() {
                return Err(empty_input("username"));
            }
            self.credentials.username = Some(username.to_string());
        }
        if self.credentials.password().is_none() {
            let password = self.ask("password", "Password: ".to_string()).await?;
            if password.is_empty() {
                return Err(empty_input("password"));
            }
            self.credentials.set_password(password);
        }
        if let Some(username) = self.credentials.username.as_deref() {
            self.credentials.username = Some(normalize_username(username));
        }
        Ok(())
    }

    /// Signature of a sign-in form stamped with `timestamp` (milliseconds).
    #[must_use]
    pub fn signature(timestamp: u64) -> String {
        compute_signature(GRANT_TYPE, CLIENT_ID, SOURCE, timestamp)
    }

    /// Routes all traffic through `proxy`, or directly with `None`.
    ///
    /// Wrappers created earlier follow the change.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidProxy`] when the proxy is malformed.
    pub fn set_proxy(&self, proxy: Option<&str>) -> Result<(), ClientError> {
        let route = proxy.map(ProxyRoute::new).transpose()?;
        self.session.set_proxy(route)
    }

    /// Sends every request through a proxy picked at random from `proxies`.
    ///
    /// With `https` unset only plain-http traffic is proxied.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidProxy`] when the list is empty or an
    /// entry is malformed.
    pub fn set_proxy_pool<S: AsRef<str>>(
        &self,
        proxies: &[S],
        auth: Option<ProxyAuth>,
        https: bool,
    ) -> Result<(), ClientError> {
        let routes = proxies
            .iter()
            .map(|proxy| {
                ProxyRoute::new(proxy.as_ref())
                    .map(|route| route.with_https(https).with_auth(auth.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.session.set_proxy_pool(&routes)?;
        info!(count = routes.len(), https, "proxy pool set");
        Ok(())
    }

    /// Drops the proxy pool.
    pub fn remove_proxy_pool(&self) {
        self.session.remove_proxy_pool();
    }

    /// Profile of the logged-in account.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on network failure, a non-2xx status (not
    /// logged in) or a payload without the expected fields.
    #[instrument(level = "debug", skip(self))]
    pub async fn me(&self) -> Result<Me, ClientError> {
        let profile: Value = self
            .session
            .get_json(&self.session.endpoints().me())
            .await?;
        Ok(Me::from_profile(&profile, self.session.clone())?)
    }

    /// Builds a wrapper by kind name (`answer`, `author`, `collection`,
    /// `column`, `post`, `question`, `topic`; case-insensitive).
    ///
    /// Returns `None` for any other name.
    #[must_use]
    pub fn resource(&self, name: &str, url: &str) -> Option<Result<Resource, ResourceError>> {
        let kind: ResourceKind = name.parse().ok()?;
        Some(Resource::new(kind, url, self.session.clone()))
    }

    typed_factory!(
        /// Wraps an answer URL.
        answer,
        Answer
    );
    typed_factory!(
        /// Wraps a people or org URL.
        author,
        Author
    );
    typed_factory!(
        /// Wraps a collection URL.
        collection,
        Collection
    );
    typed_factory!(
        /// Wraps a column URL.
        column,
        Column
    );
    typed_factory!(
        /// Wraps a column post URL.
        post,
        Post
    );
    typed_factory!(
        /// Wraps a question URL.
        question,
        Question
    );
    typed_factory!(
        /// Wraps a topic URL.
        topic,
        Topic
    );

    async fn ask(&self, what: &'static str, message: String) -> Result<String, ClientError> {
        let prompter = Arc::clone(&self.prompter);
        tokio::task::spawn_blocking(move || prompter.prompt(&message))
            .await
            .map_err(io::Error::other)
            .and_then(|answer| answer)
            .map_err(|source| ClientError::Prompt { what, source })
    }

    async fn ask_click_answer(&self) -> Result<String, ClientError> {
        let message = format!(
            "Positions of the upside-down characters in {} as x,y pairs separated by spaces: ",
            self.captcha_file.display()
        );
        let mut last_error = String::new();
        for attempt in 1..=CLICK_CAPTCHA_ATTEMPTS {
            let input = self.ask("captcha", message.clone()).await?;
            match parse_click_points(&input) {
                Ok(points) => return Ok(format_click_answer(&points)),
                Err(reason) => {
                    warn!(attempt, %reason, "could not read captcha positions");
                    last_error = reason;
                }
            }
        }
        Err(ClientError::captcha(last_error))
    }
}

/// Extracts the rejection message from a sign-in response body.
///
/// Prefers `error.message`; falls back to the whole `error` value. Returns
/// `None` when the body is not JSON or has no `error`.
#[must_use]
pub fn sign_in_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    Some(
        error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), str::to_string),
    )
}

fn empty_input(what: &'static str) -> ClientError {
    ClientError::Prompt {
        what,
        source: io::Error::new(io::ErrorKind::InvalidInput, format!("{what} is empty")),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn now_millis() -> u64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::login::{NoViewer, PlainEncryptor, ScriptedPrompter};

    fn client() -> ZhihuClient {
        ZhihuClient::builder()
            .encryptor(Arc::new(PlainEncryptor))
            .viewer(Arc::new(NoViewer))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let client = ZhihuClient::builder().build().unwrap();
        assert_eq!(client.cookie_file(), Path::new("cookies.txt"));
        assert_eq!(client.captcha_file(), Path::new("captcha.jpg"));
        assert!(client.credentials().username.is_none());
        assert_eq!(
            client.session().endpoints().signup(),
            "https://www.zhihu.com/signup"
        );
    }

    #[test]
    fn test_resource_factory_by_name() {
        let client = client();
        let resource = client
            .resource("Question", "https://www.zhihu.com/question/24825703")
            .unwrap()
            .unwrap();
        assert_eq!(resource.kind(), ResourceKind::Question);
        assert_eq!(resource.handle().id(), "24825703");

        assert!(client.resource("comment", "https://www.zhihu.com/").is_none());
        assert!(
            client
                .resource("answer", "https://www.zhihu.com/question/1")
                .unwrap()
                .is_err()
        );
    }

    #[test]
    fn test_typed_factories_share_session_proxy() {
        let client = client();
        let column = client.column("https://zhuanlan.zhihu.com/xiepanda").unwrap();
        client.set_proxy(Some("10.0.0.1:8080")).unwrap();
        assert!(column.session().proxy().is_some());
        client.set_proxy(None).unwrap();
        assert!(column.session().proxy().is_none());
    }

    #[test]
    fn test_set_proxy_pool_applies_options() {
        let client = client();
        client
            .set_proxy_pool(
                &["10.0.0.1:8080", "10.0.0.2:8080"],
                Some(ProxyAuth::new("laike9m", "123")),
                false,
            )
            .unwrap();
        assert_eq!(client.session().proxy_pool_size(), Some(2));
        client.remove_proxy_pool();
        assert_eq!(client.session().proxy_pool_size(), None);

        let empty: [&str; 0] = [];
        assert!(client.set_proxy_pool(&empty, None, true).is_err());
    }

    #[test]
    fn test_signature_matches_form_signature() {
        let mut form = LoginForm::new("u", "p", CaptchaLang::En);
        form.timestamp = 1_528_102_861_123;
        assert_eq!(ZhihuClient::signature(1_528_102_861_123), form.signature());
        assert_eq!(
            form.signature(),
            "a5fd58110ffa7b668706bc381bc0fd1ca68b3c96"
        );
    }

    #[test]
    fn test_sign_in_error_message_prefers_message() {
        let body = r#"{"error":{"code":100005,"message":"password is wrong"}}"#;
        assert_eq!(
            sign_in_error_message(body).as_deref(),
            Some("password is wrong")
        );
    }

    #[test]
    fn test_sign_in_error_message_falls_back_to_error_value() {
        let body = r#"{"error":{"code":100005}}"#;
        assert_eq!(
            sign_in_error_message(body).as_deref(),
            Some(r#"{"code":100005}"#)
        );
        assert!(sign_in_error_message("<html>error</html>").is_none());
        assert!(sign_in_error_message(r#"{"ok":true}"#).is_none());
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("短文本", 10), "短文本");
        assert_eq!(truncate_chars("错误错误错误", 2), "错误...");
    }

    #[tokio::test]
    async fn test_check_user_pass_prompts_and_normalizes() {
        let prompter = Arc::new(ScriptedPrompter::new(["13800000000", "secret"]));
        let mut client = ZhihuClient::builder()
            .prompter(prompter.clone())
            .build()
            .unwrap();
        client.check_user_pass().await.unwrap();
        assert_eq!(
            client.credentials().username.as_deref(),
            Some("+8613800000000")
        );
        assert_eq!(client.credentials().password(), Some("secret"));
        assert_eq!(prompter.asked().len(), 2);
    }

    #[tokio::test]
    async fn test_check_user_pass_skips_known_values() {
        let prompter = Arc::new(ScriptedPrompter::new(Vec::<String>::new()));
        let mut client = ZhihuClient::builder()
            .username("user@example.com")
            .password("pw")
            .prompter(prompter.clone())
            .build()
            .unwrap();
        client.check_user_pass().await.unwrap();
        assert!(prompter.asked().is_empty());
        assert_eq!(
            client.credentials().username.as_deref(),
            Some("user@example.com")
        );
    }

    #[tokio::test]
    async fn test_check_user_pass_rejects_empty_answer() {
        let mut client = ZhihuClient::builder()
            .prompter(Arc::new(ScriptedPrompter::new(["  "])))
            .build()
            .unwrap();
        let err = client.check_user_pass().await.unwrap_err();
        assert!(matches!(err, ClientError::Prompt { what: "username", .. }));
    }

    #[test]
    fn test_logout_without_file_reports_nothing_removed() {
        let dir = tempfile::tempdir().unwrap();
        let client = ZhihuClient::builder()
            .cookie_file(dir.path().join("cookies.txt"))
            .build()
            .unwrap();
        assert!(!client.logout().unwrap());
    }
}
