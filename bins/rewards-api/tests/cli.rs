//! Black-box tests of the `rewards-api` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("rewards-api").unwrap();
    cmd.env_remove("EXPO_PUBLIC_API_URL")
        .env_remove("API_URL")
        .env_remove("API_TIMEOUT_MS")
        .env_remove("REWARDS_API_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn closed_port_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

#[test]
fn help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("health"))
        .stdout(predicate::str::contains("upload"));
}

#[test]
fn config_uses_default_base_url() {
    cli()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:3000/api"))
        .stdout(predicate::str::contains("30000ms"));
}

#[test]
fn config_prefers_first_env_var() {
    cli()
        .args(["config", "--format", "json"])
        .env("EXPO_PUBLIC_API_URL", "https://primary.example.com/api")
        .env("API_URL", "https://secondary.example.com/api")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"base_url\": \"https://primary.example.com/api\""))
        .stdout(predicate::str::contains("\"timeout_ms\": 30000"));
}

#[test]
fn base_url_flag_overrides_env() {
    cli()
        .args(["config", "--base-url", "https://api.example.com/api", "--timeout-ms", "500"])
        .env("EXPO_PUBLIC_API_URL", "https://primary.example.com/api")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://api.example.com/api"))
        .stdout(predicate::str::contains("500ms"));
}

#[test]
fn unreachable_health_check_exits_with_failure() {
    cli()
        .args(["health", "--format", "json", "--base-url"])
        .arg(closed_port_base_url())
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"success\": false"))
        .stderr(predicate::str::contains("backend is not healthy"));
}

#[test]
fn invalid_json_body_is_rejected_before_sending() {
    cli()
        .args(["post", "/addresses", "--data", "{not json", "--base-url"])
        .arg(closed_port_base_url())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--data is not valid JSON"));
}

#[test]
fn malformed_query_argument_is_a_usage_error() {
    cli()
        .args(["get", "/offers", "-q", "limit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected key=value"));
}
