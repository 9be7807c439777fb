//! Import command handler: seed the cookie file from a browser export.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Result, anyhow, bail};
use tracing::{info, warn};
use zhihu_client::SessionCookieStore;
use zhihu_client::auth::import_browser_cookies;

use super::Settings;

const SITE_DOMAIN: &str = "zhihu.com";

pub fn run_import_cookies_command(settings: &Settings, file: Option<&Path>) -> Result<()> {
    let raw_input = match file {
        Some(path) => fs::read_to_string(path)
            .map_err(|error| anyhow!("Cannot read cookie file '{}': {}", path.display(), error))?,
        None => read_cookie_input()?,
    };

    let imported = import_browser_cookies(&raw_input, SITE_DOMAIN)
        .map_err(|error| anyhow!("Cookie import failed: {error}"))?;
    for warning in &imported.warnings {
        warn!("{warning}");
    }
    info!(
        format = imported.format.as_str(),
        cookies = imported.cookies.len(),
        skipped_other_sites = imported.foreign,
        "Cookie export validated"
    );

    let store = SessionCookieStore::with_cookies(imported.cookies);
    store.save(&settings.cookie_file).map_err(|error| {
        anyhow!(
            "Failed to write cookie file '{}': {error}",
            settings.cookie_file.display()
        )
    })?;
    info!(path = %settings.cookie_file.display(), "Saved imported cookies; run `zhihu status` to verify");

    Ok(())
}

fn read_cookie_input() -> Result<String> {
    if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        let trimmed = buffer.trim();
        if trimmed.is_empty() {
            bail!("No cookie data provided on stdin");
        }

        if !trimmed.contains('\n') && Path::new(trimmed).is_file() {
            let file_contents = fs::read_to_string(trimmed)
                .map_err(|error| anyhow!("Cannot read cookie file '{}': {}", trimmed, error))?;
            return Ok(file_contents);
        }

        return Ok(buffer);
    }

    info!("1. Log in to zhihu.com in your browser.");
    info!("2. Export its cookies with a cookie export extension (Netscape or JSON).");
    info!("3. Paste the export file path, then press Enter:");

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let input = line.trim();
    if input.is_empty() {
        bail!("No cookie input provided");
    }

    if Path::new(input).is_file() {
        let file_contents = fs::read_to_string(input)
            .map_err(|error| anyhow!("Cannot read cookie file '{}': {}", input, error))?;
        Ok(file_contents)
    } else {
        Ok(input.to_string())
    }
}
