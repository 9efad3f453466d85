//! Integration tests for the `verity` CLI binary.
//!
//! Argument parsing, help output, completions, and error handling run
//! without a controller; the end-to-end tests point the binary at a
//! `wiremock` server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const NO_CONFIG_DIR: &str = "/tmp/verity-cli-test-nonexistent";

/// Build a [`Command`] for the `verity` binary with env isolation.
///
/// Clears all `VERITY_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn verity_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("verity");
    cmd.env("HOME", NO_CONFIG_DIR)
        .env("XDG_CONFIG_HOME", NO_CONFIG_DIR)
        .env_remove("RUST_LOG")
        .env_remove("VERITY_PROFILE")
        .env_remove("VERITY_CONTROLLER")
        .env_remove("VERITY_TOKEN")
        .env_remove("VERITY_USERNAME")
        .env_remove("VERITY_PASSWORD")
        .env_remove("VERITY_OUTPUT")
        .env_remove("VERITY_INSECURE")
        .env_remove("VERITY_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = verity_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    verity_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Verity")
            .and(predicate::str::contains("create"))
            .and(predicate::str::contains("update"))
            .and(predicate::str::contains("delete"))
            .and(predicate::str::contains("run")),
    );
}

#[test]
fn test_version_flag() {
    verity_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("verity"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    verity_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    verity_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_resources_plain() {
    verity_cmd()
        .args(["resources", "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("acls\n")
                .and(predicate::str::contains("switchpoints\n"))
                .and(predicate::str::contains("tenants")),
        );
}

#[test]
fn test_config_show_no_config() {
    // `config show` falls back to the default config when no file exists.
    verity_cmd().args(["config", "show"]).assert().success();
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = verity_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_create_requires_payload() {
    let output = verity_cmd()
        .args(["--controller", "http://127.0.0.1:1", "create", "acls"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("--data"), "Expected payload hint:\n{text}");
}

#[test]
fn test_no_controller_configured() {
    verity_cmd()
        .args(["delete", "badges", "-y"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No controller configured"));
}

#[test]
fn test_missing_profile() {
    verity_cmd()
        .args(["--profile", "staging", "auth"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("staging"));
}

#[test]
fn test_missing_credentials_exit_code() {
    verity_cmd()
        .args([
            "--controller",
            "http://127.0.0.1:1",
            "--username",
            "admin",
            "create",
            "pods",
            "--data-json",
            "{}",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No token or username/password"));
}

#[test]
fn test_unknown_resource() {
    verity_cmd()
        .args([
            "--controller",
            "http://127.0.0.1:1",
            "--token",
            "t",
            "create",
            "vlans",
            "--data-json",
            "{}",
        ])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("vlans"));
}

#[test]
fn test_delete_without_tty_requires_yes() {
    verity_cmd()
        .args([
            "--controller",
            "http://127.0.0.1:1",
            "--token",
            "t",
            "delete",
            "badges",
        ])
        .write_stdin("")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn test_connection_refused() {
    // Port 1 is reserved and never listening.
    verity_cmd()
        .args([
            "--controller",
            "http://127.0.0.1:1",
            "--token",
            "t",
            "-y",
            "delete",
            "badges",
            "-P",
            "badge_name=X",
        ])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("badges API call failed"));
}

// ── End-to-end against a mock controller ────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_create_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/pods"))
        .and(header("cookie", "ivn_api=abc123"))
        .and(body_json(json!({"pod": {"Web": {"enable": true}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let output = verity_cmd()
        .args([
            "--controller",
            &server.uri(),
            "--token",
            "abc123",
            "-o",
            "json-compact",
            "create",
            "pods",
            "--data-json",
            r#"{"pod":{"Web":{"enable":true}}}"#,
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        r#"{"changed":true,"status":200,"response":{"id":42}}"#
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_with_login_and_changeset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .and(body_json(json!({"auth": {"username": "admin", "password": "pw"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/badges"))
        .and(query_param("badge_name", "X"))
        .and(query_param("changeset_name", "cs1"))
        .and(header("cookie", "ivn_api=fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string("deleted"))
        .expect(1)
        .mount(&server)
        .await;

    verity_cmd()
        .args([
            "--controller",
            &server.uri(),
            "--username",
            "admin",
            "--password",
            "pw",
            "-y",
            "-o",
            "plain",
            "delete",
            "badges",
            "-P",
            "badge_name=X",
            "--changeset",
            "cs1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::diff("deleted\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_auth_prints_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-1"})))
        .mount(&server)
        .await;

    let output = verity_cmd()
        .args([
            "--controller",
            &server.uri(),
            "--username",
            "admin",
            "--password",
            "pw",
            "-o",
            "json",
            "auth",
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["changed"], json!(false));
    assert_eq!(body["token"], json!("tok-1"));
    // Echoed as given, without URL normalization.
    assert_eq!(body["base_url"], json!(server.uri()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_auth_without_token_in_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    verity_cmd()
        .args([
            "--controller",
            &server.uri(),
            "--username",
            "admin",
            "--password",
            "pw",
            "auth",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no token"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_task_file_single_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "once"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/tenants"))
        .and(header("cookie", "ivn_api=once"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/gateways"))
        .and(query_param("changeset_name", "nightly"))
        .and(header("cookie", "ivn_api=once"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let tasks = dir.path().join("tasks.yaml");
    std::fs::write(
        &tasks,
        r"
tasks:
  - name: Create tenant
    resource: tenants
    data: { tenant: { Blue: { enable: true } } }
  - name: Tweak gateway
    resource: gateways
    action: update
    params: { changeset_name: nightly }
    data: { gateway: { Edge: { enable: false } } }
",
    )
    .unwrap();

    let output = verity_cmd()
        .args([
            "--controller",
            &server.uri(),
            "--username",
            "admin",
            "--password",
            "pw",
            "-o",
            "json",
            "run",
        ])
        .arg(&tasks)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reports.as_array().unwrap().len(), 2);
    assert_eq!(reports[1]["name"], json!("Tweak gateway"));
    assert_eq!(reports[1]["action"], json!("update"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_rejects_bad_task_before_sending() {
    let server = MockServer::start().await;

    let dir = tempfile::tempdir().unwrap();
    let tasks = dir.path().join("tasks.yaml");
    std::fs::write(
        &tasks,
        "- resource: tenants\n  data: {}\n- resource: vlans\n  action: delete\n",
    )
    .unwrap();

    verity_cmd()
        .args(["--controller", &server.uri(), "--token", "t", "run"])
        .arg(&tasks)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Task 2"));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread")]
async fn test_profile_from_config_file() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/mirrors"))
        .and(header("cookie", "ivn_api=from-file"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("verity");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!(
            r#"
default_profile = "lab"

[profiles.lab]
controller = "{}"
token = "from-file"

[resources.mirrors]
path = "/mirrors"
"#,
            server.uri()
        ),
    )
    .unwrap();

    verity_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["-o", "plain", "create", "mirrors", "--data-json", "{}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ok\": true"));
}

/// Write `contents` as the XDG config file under a fresh temp dir.
#[cfg(target_os = "linux")]
fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("verity");
    std::fs::create_dir_all(&config_dir).unwrap();
    let file = config_dir.join("config.toml");
    std::fs::write(&file, contents).unwrap();
    (dir, file)
}

#[cfg(target_os = "linux")]
const BROKEN_CONFIG: &str = r#"
default_profile = "lab"

[defaults]
timeout = "thirty"

[profiles.lab]
controller = "https://lab.example.com"
token = "lab-tok"

[profiles.prod]
controller = "https://prod.example.com"
token = "prod-tok"
"#;

#[test]
#[cfg(target_os = "linux")]
fn test_config_set_refuses_unparsable_file() {
    let (dir, file) = write_config(BROKEN_CONFIG);

    let output = verity_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "set", "insecure", "true"])
        .output()
        .unwrap();

    assert!(!output.status.success(), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("timeout"));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), BROKEN_CONFIG);
}

#[test]
#[cfg(target_os = "linux")]
fn test_unparsable_file_is_reported_not_missing() {
    let (dir, _file) = write_config(BROKEN_CONFIG);

    let output = verity_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["-y", "delete", "badges", "-P", "badge_name=X"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(!combined_output(&output).contains("No controller configured"));
}

#[test]
#[cfg(target_os = "linux")]
fn test_config_set_does_not_persist_env() {
    let (dir, file) = write_config(
        r#"
default_profile = "lab"

[profiles.lab]
controller = "https://lab.example.com"
"#,
    );

    verity_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .env("VERITY_DEFAULTS__TIMEOUT", "5")
        .args(["config", "set", "insecure", "true"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(&file).unwrap();
    assert!(saved.contains("https://lab.example.com"));
    assert!(!saved.contains("timeout = 5"), "{saved}");
}

#[test]
#[cfg(target_os = "linux")]
fn test_output_default_from_config() {
    let (dir, _file) = write_config(
        r#"
[defaults]
output = "json"
"#,
    );

    let output = verity_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .arg("resources")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(body.as_array().unwrap().iter().any(|r| r["name"] == json!("badges")));
}
