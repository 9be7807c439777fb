//! Captcha challenges: detection, image decoding, display and answer format.
//!
//! Two flavours exist. `en` shows four characters to type in. `cn` shows a
//! row of Chinese characters and expects the positions of the upside-down
//! ones; the image is served at double size, so clicks are halved.

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::{debug, warn};

/// Logical size of the `cn` captcha image reported with the answer.
pub const CAPTCHA_IMAGE_SIZE: [u32; 2] = [200, 44];

/// Upper bound on points accepted for a `cn` answer.
pub const MAX_CLICK_POINTS: usize = 7;

/// Captcha language requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptchaLang {
    /// Type the characters shown.
    #[default]
    En,
    /// Click the upside-down Chinese characters.
    Cn,
}

impl CaptchaLang {
    /// Query-string and form value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Cn => "cn",
        }
    }
}

impl fmt::Display for CaptchaLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptchaLang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cn" => Ok(Self::Cn),
            "en" => Ok(Self::En),
            other => Err(format!("unknown captcha language '{other}' (expected en or cn)")),
        }
    }
}

/// Whether the captcha probe response says a captcha must be solved.
///
/// The probe answers `{"show_captcha":true}` or `{"show_captcha":false}`.
#[must_use]
pub fn captcha_required(probe_body: &str) -> bool {
    probe_body.contains("true")
}

/// A captcha image fetched from the API.
#[derive(Debug, Clone)]
pub struct CaptchaChallenge {
    /// Decoded image bytes (JPEG).
    pub image: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct ChallengePayload {
    img_base64: String,
}

impl CaptchaChallenge {
    /// Decodes the `PUT` response of the captcha API.
    ///
    /// # Errors
    ///
    /// Returns a description when the body is not JSON, lacks
    /// `img_base64`, or the image is not valid base64.
    pub fn from_response(body: &str) -> Result<Self, String> {
        let payload: ChallengePayload =
            serde_json::from_str(body).map_err(|e| format!("captcha response is not JSON: {e}"))?;
        // The API wraps the base64 text with literal `\n` sequences
        let cleaned: String = payload
            .img_base64
            .replace("\\n", "")
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        if cleaned.is_empty() {
            return Err("captcha image is empty".to_string());
        }
        let image = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|e| format!("captcha image is not valid base64: {e}"))?;
        Ok(Self { image })
    }
}

/// Parses clicked positions typed as `x,y` pairs separated by whitespace.
///
/// # Errors
///
/// Returns a description when a pair is malformed, a coordinate is negative
/// or not finite, no pair is given, or more than [`MAX_CLICK_POINTS`] are.
pub fn parse_click_points(input: &str) -> Result<Vec<(f64, f64)>, String> {
    let mut points = Vec::new();
    for pair in input.split_whitespace() {
        let (x, y) = pair
            .split_once(',')
            .ok_or_else(|| format!("'{pair}' is not an x,y pair"))?;
        let x = parse_coordinate(x, pair)?;
        let y = parse_coordinate(y, pair)?;
        points.push((x, y));
    }
    if points.is_empty() {
        return Err("no points given".to_string());
    }
    if points.len() > MAX_CLICK_POINTS {
        return Err(format!(
            "{} points given, at most {MAX_CLICK_POINTS} allowed",
            points.len()
        ));
    }
    Ok(points)
}

fn parse_coordinate(raw: &str, pair: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{pair}' has a non-numeric coordinate"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("'{pair}' has an out-of-range coordinate"));
    }
    Ok(value)
}

/// Builds the `cn` answer from points clicked on the double-size image.
#[must_use]
pub fn format_click_answer(points: &[(f64, f64)]) -> String {
    let input_points: Vec<[f64; 2]> = points.iter().map(|(x, y)| [x / 2.0, y / 2.0]).collect();
    serde_json::json!({
        "img_size": CAPTCHA_IMAGE_SIZE,
        "input_points": input_points,
    })
    .to_string()
}

/// Shows a captcha image to the person at the terminal.
pub trait CaptchaViewer: Send + Sync {
    /// Displays the image at `path` without blocking the caller.
    fn show(&self, path: &Path);
}

/// Opens the image with the platform's default viewer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemViewer;

impl CaptchaViewer for SystemViewer {
    fn show(&self, path: &Path) {
        let path = path.to_path_buf();
        // Detached so the prompt can be answered while the viewer is open
        std::thread::spawn(move || {
            let mut command = opener_command(&path);
            match command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
            {
                Ok(status) if status.success() => debug!(path = %path.display(), "captcha shown"),
                Ok(status) => warn!(
                    path = %path.display(),
                    %status,
                    "image viewer exited with failure; open the captcha file manually"
                ),
                Err(error) => warn!(
                    path = %path.display(),
                    %error,
                    "could not launch an image viewer; open the captcha file manually"
                ),
            }
        });
    }
}

#[cfg(target_os = "macos")]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(path);
    command
}

#[cfg(target_os = "windows")]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(path);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}

/// Leaves the image on disk without opening it (headless runs).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoViewer;

impl CaptchaViewer for NoViewer {
    fn show(&self, path: &Path) {
        debug!(path = %path.display(), "captcha saved; not opening a viewer");
    }
}
