//! CLI command handlers.

mod fetch;
mod import;
mod login;
mod session;

pub use fetch::run_fetch_command;
pub use import::run_import_cookies_command;
pub use login::run_login_command;
pub use session::{run_logout_command, run_me_command, run_status_command};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use zhihu_client::{
    CaptchaLang, DEFAULT_CAPTCHA_FILE, DEFAULT_COOKIE_FILE, DEFAULT_ENCRYPT_SCRIPT, HttpTimeouts,
    NodeEncryptor, ProxyRoute, ZhihuClient, ZhihuClientBuilder,
};

use crate::app_config::FileConfig;

/// Effective settings after applying CLI flags over file config over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cookie_file: PathBuf,
    pub captcha_file: PathBuf,
    pub encrypt_script: PathBuf,
    pub captcha_lang: CaptchaLang,
    pub proxy: Option<String>,
    pub timeouts: HttpTimeouts,
}

impl Settings {
    pub fn resolve(
        cookie_file: Option<PathBuf>,
        proxy: Option<String>,
        file: Option<&FileConfig>,
    ) -> Self {
        let file = file.cloned().unwrap_or_default();
        let defaults = HttpTimeouts::default();
        Self {
            cookie_file: cookie_file
                .or(file.cookie_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIE_FILE)),
            captcha_file: file
                .captcha_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CAPTCHA_FILE)),
            encrypt_script: file
                .encrypt_script
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ENCRYPT_SCRIPT)),
            captcha_lang: file.captcha_lang.unwrap_or_default(),
            proxy: proxy.or(file.proxy),
            timeouts: HttpTimeouts {
                connect_secs: file.connect_timeout_secs.unwrap_or(defaults.connect_secs),
                read_secs: file.read_timeout_secs.unwrap_or(defaults.read_secs),
            },
        }
    }

    /// Client builder carrying these settings.
    pub fn client_builder(&self) -> Result<ZhihuClientBuilder> {
        let mut builder = ZhihuClient::builder()
            .cookie_file(&self.cookie_file)
            .captcha_file(&self.captcha_file)
            .timeouts(self.timeouts)
            .encryptor(Arc::new(NodeEncryptor::new(&self.encrypt_script)));
        if let Some(proxy) = &self.proxy {
            let route =
                ProxyRoute::new(proxy).with_context(|| format!("Invalid proxy '{proxy}'"))?;
            builder = builder.proxy(route);
        }
        Ok(builder)
    }

    /// Client with the saved cookies loaded, for commands that need a session.
    pub fn client_with_saved_session(&self) -> Result<ZhihuClient> {
        let client = self
            .client_builder()?
            .build()
            .context("Failed to set up HTTP session")?;
        let loaded = client.load_cookies().with_context(|| {
            format!(
                "Failed to load cookie file '{}'",
                self.cookie_file.display()
            )
        })?;
        if !loaded {
            tracing::info!(
                path = %self.cookie_file.display(),
                "No saved cookies; requests run without a session"
            );
        }
        Ok(client)
    }
}
