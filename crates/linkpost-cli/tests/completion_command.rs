use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_linkpost_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("linkpost")
}

#[test]
fn test_completion_command_help() {
    let mut cmd = Command::new(get_linkpost_bin());
    cmd.arg("completion").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Generate shell completion scripts",
        ))
        .stdout(predicate::str::contains("SUPPORTED SHELLS"))
        .stdout(predicate::str::contains("powershell"))
        .stdout(predicate::str::contains("INSTALLATION"))
        .stdout(predicate::str::contains("~/.bashrc"))
        .stdout(predicate::str::contains("~/.zshrc"));
}

#[test]
fn test_completion_bash_generates_script() {
    let mut cmd = Command::new(get_linkpost_bin());
    cmd.arg("completion").arg("--shell").arg("bash");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("_linkpost()"))
        .stdout(predicate::str::contains("complete -F _linkpost"));
}

#[test]
fn test_completion_zsh_includes_subcommands() {
    let mut cmd = Command::new(get_linkpost_bin());
    cmd.arg("completion").arg("--shell").arg("zsh");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("#compdef linkpost"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("ledger"));
}

#[test]
fn test_completion_fish_generates_script() {
    let mut cmd = Command::new(get_linkpost_bin());
    cmd.arg("completion").arg("--shell").arg("fish");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("complete -c linkpost"));
}

#[test]
fn test_completion_invalid_shell() {
    let mut cmd = Command::new(get_linkpost_bin());
    cmd.arg("completion").arg("--shell").arg("invalid-shell");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_completion_requires_shell_flag() {
    let mut cmd = Command::new(get_linkpost_bin());
    cmd.arg("completion");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_completion_ignores_broken_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "this is not toml [").unwrap();

    let mut cmd = Command::new(get_linkpost_bin());
    cmd.arg("--config")
        .arg(&config)
        .arg("completion")
        .arg("--shell")
        .arg("bash");

    cmd.assert().success();
}
