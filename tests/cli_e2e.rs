//! End-to-end CLI tests for the model-fetcher binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::{catalog_body, file_names, mount_file, mount_status};

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = support::socket_guard::start_mock_server_or_skip().await else {
            return;
        };
        mock_server
    }};
}

/// Binary command isolated from the developer's own config file and log filter.
fn isolated_cmd(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("model-fetcher").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("RUST_LOG");
    cmd
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("model-fetcher").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mirror a remote model catalog"))
        .stdout(predicate::str::contains("--concurrency"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("model-fetcher").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("model-fetcher"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("model-fetcher").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that a concurrency outside 1..=100 is rejected before any work.
#[test]
fn test_binary_concurrency_out_of_range_rejected() {
    for value in ["0", "101"] {
        let mut cmd = Command::cargo_bin("model-fetcher").unwrap();
        cmd.args(["--concurrency", value])
            .assert()
            .failure()
            .stderr(predicate::str::contains("concurrency"));
    }
}

/// Test that an unreachable catalog exits non-zero and writes no report.
#[test]
fn test_binary_catalog_unavailable_fails_without_report() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("out");

    isolated_cmd(temp.path())
        .arg("--output-dir")
        .arg(&output)
        .args(["--catalog-url", "http://127.0.0.1:1/api/models"])
        .args(["--asset-host", "http://127.0.0.1:1"])
        .arg("-q")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not load the model catalog"));

    assert!(!output.join("failed_downloads.json").exists());
    assert!(file_names(&output.join("models")).is_empty());
}

/// Test that an invalid config file fails the run with a readable message.
#[test]
fn test_binary_invalid_config_file_fails() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("bad.toml");
    std::fs::write(&config_path, "concurrency = 0\n").unwrap();

    isolated_cmd(temp.path())
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrency"));
}

/// Test a full mirror run: one asset fails, the rest land in their folders.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_full_run_writes_assets_and_report() {
    let mock_server = require_mock_server!();
    let body = catalog_body(&[
        (Some("/img/a.png"), Some("/thumb/a.png"), Some("/files/a.glb")),
        (Some("/img/b.png"), None, Some("/files/missing.glb")),
    ]);
    Mock::given(method("GET"))
        .and(path("/api/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;
    mount_file(&mock_server, "/img/a.png", b"a-img").await;
    mount_file(&mock_server, "/img/b.png", b"b-img").await;
    mount_file(&mock_server, "/thumb/a.png", b"a-thumb").await;
    mount_file(&mock_server, "/files/a.glb", b"a-model").await;
    mount_status(&mock_server, "/files/missing.glb", 404).await;

    let temp = TempDir::new().unwrap();
    let output = temp.path().join("out");
    let uri = mock_server.uri();

    let run_output = output.clone();
    let config_home = temp.path().to_path_buf();
    let assert = tokio::task::spawn_blocking(move || {
        isolated_cmd(&config_home)
            .arg("--output-dir")
            .arg(&run_output)
            .args(["--catalog-url", &format!("{uri}/api/models")])
            .args(["--asset-host", &uri])
            .args(["--concurrency", "2"])
            .assert()
    })
    .await
    .unwrap();
    assert
        .success()
        .stdout(predicate::str::contains("run complete"));

    assert_eq!(file_names(&output.join("img")), vec!["a.png", "b.png"]);
    assert_eq!(file_names(&output.join("thumb")), vec!["a.png"]);
    assert_eq!(file_names(&output.join("models")), vec!["a.glb"]);
    assert_eq!(std::fs::read(output.join("thumb/a.png")).unwrap(), b"a-thumb");

    let report: serde_json::Value =
        serde_json::from_slice(&std::fs::read(output.join("failed_downloads.json")).unwrap())
            .unwrap();
    let failures = report["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["type"], "model");
    assert_eq!(failures[0]["url"], format!("{}/files/missing.glb", mock_server.uri()));
    assert_eq!(failures[0]["error"], "download failed, status: 404");
    assert!(report["timestamp"].is_string());
}

/// Test that values from the config file apply when no flag overrides them.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_reads_defaults_from_config_file() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(catalog_body(&[(Some("/only.png"), None, None)])),
        )
        .mount(&mock_server)
        .await;
    mount_file(&mock_server, "/only.png", b"only").await;

    let temp = TempDir::new().unwrap();
    let output = temp.path().join("from-config");
    let config_dir = temp.path().join("model-fetcher");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!(
            "output_dir = \"{}\"\ncatalog_url = \"{}/listing\"\nasset_host = \"{}\"\nverbosity = \"quiet\"\n",
            output.display(),
            mock_server.uri(),
            mock_server.uri()
        ),
    )
    .unwrap();

    let config_home = temp.path().to_path_buf();
    let assert = tokio::task::spawn_blocking(move || isolated_cmd(&config_home).assert())
        .await
        .unwrap();
    assert.success();

    assert_eq!(file_names(&output.join("img")), vec!["only.png"]);
    assert!(!output.join("failed_downloads.json").exists());
}
