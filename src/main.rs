//! CLI entry point for the zhihu client.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod app_config;
mod cli;
mod commands;

use app_config::load_default_file_config;
use cli::{Args, Command};
use commands::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    init_tracing(default_log_level(args.verbose, args.quiet));
    debug!(?args, "CLI arguments parsed");

    let loaded_config = load_default_file_config()?;
    if let Some(path) = &loaded_config.path {
        debug!(
            path = %path.display(),
            loaded = loaded_config.config.is_some(),
            "config file resolved"
        );
    }
    let settings = Settings::resolve(
        args.cookie_file.clone(),
        args.proxy.clone(),
        loaded_config.config.as_ref(),
    );

    match args.command {
        Command::Login(login_args) => commands::run_login_command(&settings, login_args).await,
        Command::Status => commands::run_status_command(&settings).await,
        Command::Logout => commands::run_logout_command(&settings),
        Command::Me => commands::run_me_command(&settings).await,
        Command::Fetch { kind, url } => commands::run_fetch_command(&settings, &kind, &url).await,
        Command::ImportCookies { file } => {
            commands::run_import_cookies_command(&settings, file.as_deref())
        }
    }
}

/// Log level used when `RUST_LOG` is unset.
///
/// Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
fn default_log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
