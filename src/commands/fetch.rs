//! Fetch command handler: look a page up by kind name and print its JSON.

use anyhow::{Context, Result, bail};
use tracing::debug;
use zhihu_client::ResourceKind;

use super::Settings;

pub async fn run_fetch_command(settings: &Settings, kind: &str, url: &str) -> Result<()> {
    if kind.parse::<ResourceKind>().is_err() {
        bail!(
            "Unknown resource kind '{kind}'. Expected one of: {}",
            kind_names()
        );
    }

    let client = settings.client_with_saved_session()?;
    let Some(resource) = client.resource(kind, url) else {
        bail!("Unknown resource kind '{kind}'");
    };
    let resource = resource.with_context(|| format!("Cannot use '{url}' as a {kind}"))?;
    debug!(api_url = %resource.handle().api_url(), "fetching resource");

    let json = resource
        .fetch()
        .await
        .with_context(|| format!("Failed to fetch {kind} '{url}'"))?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn kind_names() -> String {
    ResourceKind::ALL
        .iter()
        .map(|kind| kind.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_lists_every_kind() {
        assert_eq!(
            kind_names(),
            "answer, author, collection, column, post, question, topic"
        );
    }
}
