//! End-to-end CLI tests for the zhihu binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command with config lookups pointed at an empty directory.
fn zhihu(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("zhihu").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(config_home: &std::path::Path, contents: &str) {
    let config_dir = config_home.join("zhihu-client");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), contents).unwrap();
}

#[test]
fn test_binary_help_displays_usage() {
    let home = TempDir::new().unwrap();
    zhihu(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sign in to Zhihu"))
        .stdout(predicate::str::contains("import-cookies"));
}

#[test]
fn test_binary_version_displays_version() {
    let home = TempDir::new().unwrap();
    zhihu(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("zhihu"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let home = TempDir::new().unwrap();
    zhihu(&home)
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_fetch_unknown_kind_fails_before_network() {
    let home = TempDir::new().unwrap();
    zhihu(&home)
        .args(["fetch", "comment", "https://www.zhihu.com/question/1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown resource kind 'comment'"))
        .stderr(predicate::str::contains("answer, author, collection"));
}

#[test]
fn test_binary_fetch_mismatched_url_fails_before_network() {
    let home = TempDir::new().unwrap();
    let cookie_file = home.path().join("cookies.txt");
    zhihu(&home)
        .args(["fetch", "answer", "https://zhuanlan.zhihu.com/p/20153038"])
        .arg("--cookie-file")
        .arg(&cookie_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a answer URL"));
}

#[test]
fn test_binary_logout_removes_cookie_file() {
    let home = TempDir::new().unwrap();
    let cookie_file = home.path().join("cookies.txt");
    std::fs::write(&cookie_file, "# Netscape HTTP Cookie File\n").unwrap();

    zhihu(&home)
        .arg("logout")
        .arg("--cookie-file")
        .arg(&cookie_file)
        .assert()
        .success();
    assert!(!cookie_file.exists());
}

#[test]
fn test_binary_status_without_cookies_reports_logged_out() {
    let home = TempDir::new().unwrap();
    let cookie_file = home.path().join("missing.txt");
    zhihu(&home)
        .arg("status")
        .arg("--cookie-file")
        .arg(&cookie_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("logged_in = false"));
}

#[test]
fn test_binary_import_cookies_keeps_only_site_cookies() {
    let home = TempDir::new().unwrap();
    let export = home.path().join("export.txt");
    let cookie_file = home.path().join("session").join("cookies.txt");
    std::fs::write(
        &export,
        "# Netscape HTTP Cookie File\n\
         .zhihu.com\tTRUE\t/\tFALSE\t0\tz_c0\tabc\n\
         .example.com\tTRUE\t/\tFALSE\t0\tother\txyz\n",
    )
    .unwrap();

    zhihu(&home)
        .arg("import-cookies")
        .arg(&export)
        .arg("--cookie-file")
        .arg(&cookie_file)
        .assert()
        .success();

    let saved = std::fs::read_to_string(&cookie_file).unwrap();
    assert!(saved.contains("z_c0\tabc"));
    assert!(!saved.contains("example.com"));
}

#[test]
fn test_binary_rejects_invalid_config_file() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), "read_timeout_secs = 0\n");
    zhihu(&home)
        .arg("logout")
        .arg("--cookie-file")
        .arg(home.path().join("cookies.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("read_timeout_secs"));
}
