//! Integration tests for init and config commands

#![allow(deprecated)]

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

mod common;
use common::{crudkit_cmd, write_project};

#[test]
fn test_init_creates_config_and_data_dir() {
    let temp = TempDir::new().unwrap();

    crudkit_cmd()
        .arg("init")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized crudkit project"));

    let config_path = temp.path().join(".crudkit/config.toml");
    assert!(config_path.exists());
    assert!(temp.path().join("data").is_dir());

    let content = fs::read_to_string(config_path).unwrap();
    assert!(content.contains("endpoint = \"data\""));
    assert!(content.contains("page_len = 10"));
}

#[test]
fn test_init_with_remote_endpoint() {
    let temp = TempDir::new().unwrap();

    crudkit_cmd()
        .arg("init")
        .arg(temp.path())
        .arg("--endpoint")
        .arg("http://localhost:8080/api")
        .assert()
        .success();

    let content = fs::read_to_string(temp.path().join(".crudkit/config.toml")).unwrap();
    assert!(content.contains("endpoint = \"http://localhost:8080/api\""));
    assert!(!temp.path().join("data").exists());
}

#[test]
fn test_init_already_initialized_fails() {
    let temp = TempDir::new().unwrap();

    crudkit_cmd().arg("init").arg(temp.path()).assert().success();

    crudkit_cmd()
        .arg("init")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_config_get_endpoint() {
    let temp = TempDir::new().unwrap();
    crudkit_cmd().arg("init").arg(temp.path()).assert().success();

    crudkit_cmd()
        .current_dir(temp.path())
        .arg("config")
        .arg("endpoint")
        .assert()
        .success()
        .stdout(predicate::str::contains("data"));
}

#[test]
fn test_config_set_page_len() {
    let temp = TempDir::new().unwrap();
    crudkit_cmd().arg("init").arg(temp.path()).assert().success();

    crudkit_cmd()
        .current_dir(temp.path())
        .arg("config")
        .arg("page_len")
        .arg("25")
        .assert()
        .success()
        .stdout(predicate::str::contains("Set page_len = 25"));

    crudkit_cmd()
        .current_dir(temp.path())
        .arg("config")
        .arg("page_len")
        .assert()
        .success()
        .stdout(predicate::str::contains("25"));

    crudkit_cmd()
        .current_dir(temp.path())
        .arg("config")
        .arg("page_len")
        .arg("zero")
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a positive integer"));
}

#[test]
fn test_config_list() {
    let temp = TempDir::new().unwrap();
    crudkit_cmd().arg("init").arg(temp.path()).assert().success();

    crudkit_cmd()
        .current_dir(temp.path())
        .arg("config")
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("endpoint = data"))
        .stdout(predicate::str::contains("pages_to_show = 3"))
        .stdout(predicate::str::contains("timeout_secs").not());
}

#[test]
fn test_config_created_is_read_only() {
    let temp = TempDir::new().unwrap();
    crudkit_cmd().arg("init").arg(temp.path()).assert().success();

    crudkit_cmd()
        .current_dir(temp.path())
        .arg("config")
        .arg("created")
        .arg("2020-01-01T00:00:00Z")
        .assert()
        .failure()
        .stderr(predicate::str::contains("read-only"));
}

#[test]
fn test_config_unknown_key() {
    let temp = TempDir::new().unwrap();
    crudkit_cmd().arg("init").arg(temp.path()).assert().success();

    crudkit_cmd()
        .current_dir(temp.path())
        .arg("config")
        .arg("editor")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key: 'editor'"))
        .stderr(predicate::str::contains("Valid keys"));
}

#[test]
fn test_outside_project_fails() {
    let temp = TempDir::new().unwrap();

    crudkit_cmd()
        .current_dir(temp.path())
        .arg("list")
        .arg("wine")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Not a crudkit directory"));
}

#[test]
fn test_crudkit_root_env() {
    let project = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    write_project(project.path());

    crudkit_cmd()
        .current_dir(elsewhere.path())
        .env("CRUDKIT_ROOT", project.path())
        .arg("count")
        .arg("wine")
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn test_discovery_from_subdirectory() {
    let temp = TempDir::new().unwrap();
    write_project(temp.path());
    let nested = temp.path().join("a/b");
    fs::create_dir_all(&nested).unwrap();

    crudkit_cmd()
        .current_dir(&nested)
        .arg("count")
        .arg("wine")
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn test_verbose_logs_to_stderr() {
    let temp = TempDir::new().unwrap();
    write_project(temp.path());

    crudkit_cmd()
        .current_dir(temp.path())
        .arg("-vv")
        .arg("count")
        .arg("wine")
        .assert()
        .success()
        .stdout("3\n")
        .stderr(predicate::str::contains("using file backend"));
}
