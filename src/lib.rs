//! Zhihu Client Library
//!
//! Signs in to Zhihu with a password, keeps the session cookies on disk and
//! hands out typed wrappers (answers, authors, questions, ...) that share
//! the logged-in session.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`auth`] - Cookie file format, the session cookie store, browser imports
//! - [`login`] - Sign-in form, signature, captcha, form cipher, prompts
//! - [`session`] - Shared HTTP session, endpoints and proxy routing
//! - [`client`] - The sign-in flow and the resource factory
//! - [`resource`] - Typed page wrappers and the logged-in profile

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod error;
pub mod login;
pub mod resource;
pub mod session;
mod user_agent;

// Re-export commonly used types
pub use auth::{CookieError, CookieLine, SessionCookieStore};
pub use client::{
    DEFAULT_CAPTCHA_FILE, DEFAULT_COOKIE_FILE, DEFAULT_ENCRYPT_SCRIPT, ZhihuClient,
    ZhihuClientBuilder,
};
pub use error::ClientError;
pub use login::{
    CaptchaLang, Credentials, FormEncryptor, NodeEncryptor, PlainEncryptor, Prompter,
    TerminalPrompter,
};
pub use resource::{
    Answer, Author, Collection, Column, Me, Post, Question, Resource, ResourceError, ResourceKind,
    Topic,
};
pub use session::{Endpoints, HttpTimeouts, ProxyAuth, ProxyRoute, Session};
pub use user_agent::BROWSER_USER_AGENT;
