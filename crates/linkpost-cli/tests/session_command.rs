use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

#[allow(deprecated)]
fn get_linkpost_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("linkpost")
}

fn linkpost(state_dir: &Path) -> Command {
    let mut cmd = Command::new(get_linkpost_bin());
    cmd.env("HOME", state_dir)
        .env_remove("LINKPOST_CONFIG")
        .arg("--state-dir")
        .arg(state_dir);
    cmd
}

const SAVED_SESSION: &str = r#"{
  "cookies": [
    {
      "name": "sid",
      "value": "secret-value",
      "domain": ".rizz.app",
      "path": "/",
      "expires": -1,
      "httpOnly": true,
      "secure": true,
      "sameSite": "Lax"
    },
    {
      "name": "old",
      "value": "stale",
      "domain": "creator.rizz.app",
      "path": "/",
      "expires": 1000,
      "httpOnly": false,
      "secure": true
    }
  ],
  "origins": [],
  "savedAt": "2026-10-01T12:00:00Z"
}"#;

#[test]
fn test_session_show_without_file() {
    let dir = tempfile::tempdir().unwrap();

    linkpost(dir.path())
        .arg("session")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved session"));
}

#[test]
fn test_session_show_summarises_without_values() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("state.json"), SAVED_SESSION).unwrap();

    linkpost(dir.path())
        .arg("session")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-10-01 12:00:00 UTC"))
        .stdout(predicate::str::contains("Cookies:  2 (1 expired)"))
        .stdout(predicate::str::contains(".rizz.app"))
        .stdout(predicate::str::contains("secret-value").not());
}

#[test]
fn test_session_clear_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("state.json"), SAVED_SESSION).unwrap();

    linkpost(dir.path())
        .arg("session")
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session cleared"));
    assert!(!dir.path().join("state.json").exists());

    linkpost(dir.path())
        .arg("session")
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved session to clear"));
}
