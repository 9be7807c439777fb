//! Login command handler.

use anyhow::{Context, Result, bail};
use tracing::info;
use zhihu_client::Credentials;

use super::Settings;
use crate::cli::LoginArgs;

pub async fn run_login_command(settings: &Settings, args: LoginArgs) -> Result<()> {
    let lang = args.captcha_lang.unwrap_or(settings.captcha_lang);
    let mut client = settings
        .client_builder()?
        .credentials(Credentials::new(args.username, args.password))
        .build()
        .context("Failed to set up HTTP session")?;

    let logged_in = client
        .login(lang, !args.fresh)
        .await
        .context("Login could not complete")?;

    if !logged_in {
        bail!("Login failed; check the username, password and captcha answer");
    }

    info!(path = %client.cookie_file().display(), "Logged in; session cookies saved");
    Ok(())
}
