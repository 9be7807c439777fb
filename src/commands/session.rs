//! Session command handlers: status, logout and the current profile.

use anyhow::{Context, Result};
use tracing::info;

use super::Settings;

pub async fn run_status_command(settings: &Settings) -> Result<()> {
    let client = settings.client_with_saved_session()?;
    let logged_in = if client.session().cookies().is_empty() {
        false
    } else {
        client
            .check_login()
            .await
            .context("Failed to check login state")?
    };

    println!("cookie_file = {}", settings.cookie_file.display());
    println!("logged_in = {logged_in}");
    Ok(())
}

pub fn run_logout_command(settings: &Settings) -> Result<()> {
    let client = settings
        .client_builder()?
        .build()
        .context("Failed to set up HTTP session")?;
    let removed = client.logout().context("Failed to remove cookie file")?;

    if removed {
        info!(path = %settings.cookie_file.display(), "Removed saved cookies");
    } else {
        info!(path = %settings.cookie_file.display(), "No saved cookies found");
    }
    Ok(())
}

pub async fn run_me_command(settings: &Settings) -> Result<()> {
    let client = settings.client_with_saved_session()?;
    let me = client
        .me()
        .await
        .context("Failed to read profile; run `zhihu login` first")?;

    println!("name = {}", me.name);
    println!("url = {}", me.url);
    println!("motto = {}", me.motto);
    println!("photo = {}", me.photo);
    Ok(())
}
