//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use zhihu_client::CaptchaLang;

/// TOML-backed file configuration for client defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Cookie file used to persist the session.
    pub cookie_file: Option<PathBuf>,
    /// Where captcha images are written.
    pub captcha_file: Option<PathBuf>,
    /// Script defining the sign-in form cipher.
    pub encrypt_script: Option<PathBuf>,
    /// Captcha language requested at sign-in.
    pub captcha_lang: Option<CaptchaLang>,
    /// Proxy applied to all traffic.
    pub proxy: Option<String>,
    /// Optional connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Optional whole-request timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if let Some(proxy) = &self.proxy
            && proxy.trim().is_empty()
        {
            bail!("Invalid config value for `proxy`: expected a proxy URL");
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/zhihu-client/config.toml`
/// 2. `$HOME/.config/zhihu-client/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("zhihu-client")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("zhihu-client")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_number = line_index + 1;

        match key {
            "cookie_file" | "captcha_file" | "encrypt_script" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `{key}` value on line {line_number}"))?;
                let path = Some(PathBuf::from(parsed));
                match key {
                    "cookie_file" => cfg.cookie_file = path,
                    "captcha_file" => cfg.captcha_file = path,
                    _ => cfg.encrypt_script = path,
                }
            }
            "captcha_lang" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `captcha_lang` value on line {line_number}")
                })?;
                let lang = parsed.parse::<CaptchaLang>().map_err(|reason| {
                    anyhow::anyhow!("Invalid `captcha_lang` value on line {line_number}: {reason}")
                })?;
                cfg.captcha_lang = Some(lang);
            }
            "proxy" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `proxy` value on line {line_number}"))?;
                cfg.proxy = Some(parsed);
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_number}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_number}")
                })?;
                cfg.read_timeout_secs = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
cookie_file = "/tmp/zhihu/cookies.txt"
captcha_file = "/tmp/zhihu/captcha.jpg"
encrypt_script = "/opt/zhihu/encrypt.js"
captcha_lang = "cn"
proxy = "http://10.0.0.1:8080"
connect_timeout_secs = 5
read_timeout_secs = 60
"#,
        )
        .expect("full config should parse");
        assert_eq!(
            cfg.cookie_file,
            Some(PathBuf::from("/tmp/zhihu/cookies.txt"))
        );
        assert_eq!(
            cfg.captcha_file,
            Some(PathBuf::from("/tmp/zhihu/captcha.jpg"))
        );
        assert_eq!(
            cfg.encrypt_script,
            Some(PathBuf::from("/opt/zhihu/encrypt.js"))
        );
        assert_eq!(cfg.captcha_lang, Some(CaptchaLang::Cn));
        assert_eq!(cfg.proxy.as_deref(), Some("http://10.0.0.1:8080"));
        assert_eq!(cfg.connect_timeout_secs, Some(5));
        assert_eq!(cfg.read_timeout_secs, Some(60));
    }

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(r#"captcha_lang = "en""#).expect("partial config should parse");
        assert_eq!(cfg.captcha_lang, Some(CaptchaLang::En));
        assert!(cfg.cookie_file.is_none());
        assert!(cfg.proxy.is_none());
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
proxy = "http://10.0.0.1:8080#frag" # office proxy
read_timeout_secs = 45 # slow network
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.proxy.as_deref(), Some("http://10.0.0.1:8080#frag"));
        assert_eq!(cfg.read_timeout_secs, Some(45));
    }

    #[test]
    fn test_parse_config_rejects_invalid_timeout_value() {
        let err = parse_config_str("connect_timeout_secs = 0").expect_err("invalid timeout expected");
        assert!(err.to_string().contains("connect_timeout_secs"));

        let err = parse_config_str("read_timeout_secs = 3601").expect_err("invalid timeout expected");
        assert!(err.to_string().contains("read_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_captcha_lang() {
        let err = parse_config_str(r#"captcha_lang = "fr""#).expect_err("invalid lang expected");
        assert!(err.to_string().contains("captcha_lang"));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_path() {
        let err = parse_config_str("cookie_file = cookies.txt").expect_err("quotes required");
        assert!(err.to_string().contains("cookie_file"));
    }

    #[test]
    fn test_parse_config_rejects_numeric_values_with_trailing_tokens() {
        let err = parse_config_str("read_timeout_secs = 4 trailing")
            .expect_err("expected trailing token error");
        assert!(err.to_string().contains("read_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("unknown_key = 123").expect_err("unknown key error expected");
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("unknown_key"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("proxy").expect_err("syntax error expected");
        assert!(err.to_string().contains("expected key = value"));
    }
}
