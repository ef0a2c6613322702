use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn labparts() -> Command {
    let mut cmd = Command::cargo_bin("labparts").unwrap();
    cmd.env_remove("LABPARTS_HOME");
    cmd
}

#[test]
fn help_lists_the_options() {
    labparts()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--base-dir"))
        .stdout(predicate::str::contains("--viewer"));
}

#[test]
fn missing_data_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();

    labparts()
        .arg("--base-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("data.json"))
        .stderr(predicate::str::contains("not found"));

    assert!(!dir.path().join("db").join("components.db").exists());
}

#[test]
fn malformed_data_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data").join("data.json"), "{ not json").unwrap();

    labparts()
        .env("LABPARTS_HOME", dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading JSON data"));
}
