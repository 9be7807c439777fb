//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use zhihu_client::CaptchaLang;

/// Sign in to Zhihu and read pages through the saved session.
///
/// The session cookies are kept in a cookie file so later runs reuse the
/// login until the site expires it.
#[derive(Parser, Debug)]
#[command(name = "zhihu")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Cookie file used to persist the session (default: ./cookies.txt)
    #[arg(long, global = true)]
    pub cookie_file: Option<PathBuf>,

    /// Route all traffic through this proxy (http://host:port)
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in, reusing saved cookies when they are still valid
    Login(LoginArgs),

    /// Report whether the saved cookies are still logged in
    Status,

    /// Delete the saved cookies
    Logout,

    /// Show the profile of the logged-in account
    Me,

    /// Fetch a page's JSON through the v4 API
    Fetch {
        /// Resource kind: answer, author, collection, column, post, question, topic
        kind: String,

        /// Page URL
        url: String,
    },

    /// Seed the cookie file from a browser cookie export (Netscape or JSON)
    ImportCookies {
        /// Export file; reads stdin when omitted
        file: Option<PathBuf>,
    },
}

/// Arguments of the `login` command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LoginArgs {
    /// Phone number or email; prompted when omitted
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password; prompted when omitted
    #[arg(short, long)]
    pub password: Option<String>,

    /// Captcha language: en (type characters) or cn (click upside-down characters)
    #[arg(long, value_parser = parse_captcha_lang)]
    pub captcha_lang: Option<CaptchaLang>,

    /// Ignore saved cookies and sign in again
    #[arg(long)]
    pub fresh: bool,
}

fn parse_captcha_lang(value: &str) -> Result<CaptchaLang, String> {
    value.parse()
}
