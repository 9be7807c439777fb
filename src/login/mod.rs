//! Sign-in handshake building blocks: the form, its signature, the captcha
//! answer, the encryption hand-off and the terminal prompts.

mod captcha;
mod encrypt;
mod prompt;
mod signature;

pub use captcha::{
    CAPTCHA_IMAGE_SIZE, CaptchaChallenge, CaptchaLang, CaptchaViewer, MAX_CLICK_POINTS,
    NoViewer, SystemViewer, captcha_required, format_click_answer, parse_click_points,
};
pub use encrypt::{FormEncryptor, NodeEncryptor, PlainEncryptor};
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use signature::{SIGNATURE_KEY, compute_signature};

use std::fmt;

/// OAuth client id of the web front end.
pub const CLIENT_ID: &str = "c3cef7c66a1843f8b3a9e6a1e3160e20";
/// Grant type used for password sign-in.
pub const GRANT_TYPE: &str = "password";
/// Source tag of the web front end.
pub const SOURCE: &str = "com.zhihu.web";
/// Value of the `x-zse-83` header the sign-in API expects.
pub const ZSE_83_VERSION: &str = "3_1.1";

/// Username and password, either of which may still need prompting.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Phone number or email.
    pub username: Option<String>,
    password: Option<String>,
}

impl Credentials {
    /// Creates credentials; empty strings count as missing.
    #[must_use]
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self {
            username: username.filter(|value| !value.is_empty()),
            password: password.filter(|value| !value.is_empty()),
        }
    }

    /// Returns the password, if known.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Sets the password.
    pub fn set_password(&mut self, password: String) {
        self.password = Some(password).filter(|value| !value.is_empty());
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Adds the mainland country code to bare phone numbers.
///
/// `13800000000` becomes `+8613800000000`; emails and numbers that already
/// carry `+86` pass through unchanged.
#[must_use]
pub fn normalize_username(username: &str) -> String {
    let is_bare_number = !username.is_empty() && username.chars().all(|c| c.is_ascii_digit());
    if is_bare_number && !username.contains("+86") {
        format!("+86{username}")
    } else {
        username.to_string()
    }
}

/// The sign-in form, in the field order the encryptor expects.
#[derive(Clone)]
pub struct LoginForm {
    /// Normalized username.
    pub username: String,
    password: String,
    /// Captcha language the answer was produced for.
    pub lang: CaptchaLang,
    /// Captcha answer; empty when none was required.
    pub captcha: String,
    /// Unix time in milliseconds.
    pub timestamp: u64,
}

impl LoginForm {
    /// Creates a form with an empty captcha and a zero timestamp.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>, lang: CaptchaLang) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            lang,
            captcha: String::new(),
            timestamp: 0,
        }
    }

    /// Signature over the fixed fields and the form's timestamp.
    #[must_use]
    pub fn signature(&self) -> String {
        compute_signature(GRANT_TYPE, CLIENT_ID, SOURCE, self.timestamp)
    }

    /// Ordered `(field, value)` pairs as submitted.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("client_id", CLIENT_ID.to_string()),
            ("grant_type", GRANT_TYPE.to_string()),
            ("source", SOURCE.to_string()),
            ("username", self.username.clone()),
            ("password", self.password.clone()),
            ("lang", self.lang.as_str().to_string()),
            ("ref_source", "homepage".to_string()),
            ("utm_source", String::new()),
            ("captcha", self.captcha.clone()),
            ("timestamp", self.timestamp.to_string()),
            ("signature", self.signature()),
        ]
    }

    /// Url-encodes the form (`application/x-www-form-urlencoded`).
    #[must_use]
    pub fn to_urlencoded(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.fields() {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("lang", &self.lang)
            .field("captcha", &self.captcha)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}
