//! CLI 端到端测试（不需要设备）

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("roboarm-cli").unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("move"))
        .stdout(predicate::str::contains("play"))
        .stdout(predicate::str::contains("shell"));
}

#[test]
fn test_info_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("program.txt");
    std::fs::write(
        &path,
        "1.500000 64 0 0 128 0 0\n60.000000 0 1 0 0 2 0\n0.000000 0 0 0 0 0 0\n",
    )
    .unwrap();

    cli()
        .arg("info")
        .arg(&path)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"steps\": 3"))
        .stdout(predicate::str::contains("\"runtime\": \"01:01\""));
}

#[test]
fn test_info_rejects_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.txt");
    std::fs::write(&path, "0.5 64 0\n").unwrap();

    cli()
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1"));
}

#[test]
fn test_move_rejects_unknown_direction_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["move", "light", "down"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("light"));
}
