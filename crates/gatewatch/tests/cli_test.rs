//! End-to-end CLI tests: argument parsing, exit codes, and config
//! commands that never touch a gateway.

use assert_cmd::Command;
use predicates::prelude::*;

fn gatewatch() -> Command {
    let mut cmd = Command::cargo_bin("gatewatch").expect("binary builds");
    // Isolate from the developer's real config and credentials
    cmd.env_remove("GATEWATCH_PROFILE")
        .env_remove("GATEWATCH_GATEWAY")
        .env_remove("GATEWATCH_ACCOUNT")
        .env_remove("GATEWATCH_API_KEY")
        .env_remove("GATEWATCH_SHARE_TOKEN")
        .env_remove("GATEWATCH_OUTPUT")
        .env_remove("GATEWATCH_INSECURE")
        .env_remove("GATEWATCH_TIMEOUT");
    cmd
}

fn gatewatch_with_home(home: &std::path::Path) -> Command {
    let mut cmd = gatewatch();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

#[test]
fn help_lists_subcommands() {
    gatewatch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("share"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn no_args_shows_usage() {
    gatewatch()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_flag_is_usage_error() {
    gatewatch()
        .args(["status", "--no-such-flag"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn status_help_documents_node_argument() {
    gatewatch()
        .args(["status", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("node"));
}

#[test]
fn completions_emit_shell_script() {
    gatewatch()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gatewatch"));
}

#[test]
fn status_without_config_points_at_config_init() {
    let home = tempfile::tempdir().expect("tempdir");
    gatewatch_with_home(home.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config init"));
}

#[test]
fn missing_credentials_is_an_auth_error() {
    let home = tempfile::tempdir().expect("tempdir");
    gatewatch_with_home(home.path())
        .args(["status", "--gateway", "https://gw.example.com"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("credentials"));
}

#[test]
fn invalid_share_expiry_is_rejected_before_connecting() {
    let home = tempfile::tempdir().expect("tempdir");
    gatewatch_with_home(home.path())
        .args([
            "share",
            "create",
            "--expire-in",
            "5h",
            "--gateway",
            "https://gw.example.com",
            "--api-key",
            "sk-test",
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("expire-in"));
}

#[test]
fn config_path_prints_toml_location() {
    let home = tempfile::tempdir().expect("tempdir");
    gatewatch_with_home(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_init_creates_profile_and_lists_it() {
    let home = tempfile::tempdir().expect("tempdir");

    gatewatch_with_home(home.path())
        .args([
            "config",
            "init",
            "--gateway",
            "https://gw.example.com",
            "--name",
            "staging",
            "--api-key-env",
            "STAGING_KEY",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("staging"));

    gatewatch_with_home(home.path())
        .args(["config", "profiles", "--output", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("staging"));
}

#[test]
fn config_init_rejects_bad_gateway_url() {
    let home = tempfile::tempdir().expect("tempdir");
    gatewatch_with_home(home.path())
        .args(["config", "init", "--gateway", "not a url"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid URL"));
}

#[test]
fn config_use_unknown_profile_fails_with_not_found() {
    let home = tempfile::tempdir().expect("tempdir");
    gatewatch_with_home(home.path())
        .args(["config", "use", "ghost"])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn config_use_switches_default_profile() {
    let home = tempfile::tempdir().expect("tempdir");

    for name in ["alpha", "beta"] {
        gatewatch_with_home(home.path())
            .args([
                "config",
                "init",
                "--gateway",
                "https://gw.example.com",
                "--name",
                name,
            ])
            .assert()
            .success();
    }

    gatewatch_with_home(home.path())
        .args(["config", "use", "beta"])
        .assert()
        .success()
        .stderr(predicate::str::contains("beta"));
}
