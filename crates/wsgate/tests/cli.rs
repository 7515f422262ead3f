//! Command-line behaviour of the wsgate binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn wsgate(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wsgate").unwrap();
    cmd.env("WSGATE_CONFIG_DIR", config_dir.path())
        .current_dir(config_dir.path());
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    wsgate(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_path_honours_env() {
    let dir = TempDir::new().unwrap();
    wsgate(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(
            dir.path().to_string_lossy().as_ref(),
        ));
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();

    wsgate(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));
    assert!(dir.path().join("config.toml").is_file());

    wsgate(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mode = \"deny_all\""))
        .stdout(predicate::str::contains("ttl_secs = 3600"));
}

#[test]
fn test_start_rejects_unknown_auth_mode() {
    let dir = TempDir::new().unwrap();
    wsgate(&dir)
        .args(["start", "--port", "0", "--auth", "trust_me"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown auth mode"));
}

#[test]
fn test_start_rejects_bad_bind() {
    let dir = TempDir::new().unwrap();
    wsgate(&dir)
        .args(["start", "--bind", "not-an-ip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("server.bind"));
}

#[test]
fn test_start_rejects_unbounded_ttl() {
    let dir = TempDir::new().unwrap();
    wsgate(&dir)
        .args(["start", "--port", "0", "--ttl-secs", "18446744073709551615"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sessions.ttl_secs"));
}

#[test]
fn test_config_which_lists_both_layers() {
    let dir = TempDir::new().unwrap();
    wsgate(&dir)
        .args(["config", "which"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user"))
        .stdout(predicate::str::contains("project"))
        .stdout(predicate::str::contains("wsgate.toml"));
}
