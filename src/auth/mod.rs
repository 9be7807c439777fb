//! Session cookies: the Netscape cookie file, the live store shared by the
//! HTTP client, and browser-export import.

mod cookies;
mod import;
mod store;

pub use cookies::{
    CookieError, CookieLine, NETSCAPE_HEADER, ParseResult, parse_netscape_cookies,
    write_netscape_cookies,
};
pub use import::{ExportFormat, ImportError, ImportedCookies, import_browser_cookies};
pub use store::SessionCookieStore;
