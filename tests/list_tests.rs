//! Integration tests for list and count commands

#![allow(deprecated)]

use predicates::prelude::*;
use tempfile::TempDir;

mod common;
use common::{crudkit_cmd, write_project};

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_project(temp.path());
    temp
}

#[test]
fn test_list_first_page() {
    let temp = project();

    let output = crudkit_cmd()
        .current_dir(temp.path())
        .arg("list")
        .arg("wine")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "id  name     color  price");
    assert_eq!(lines[1], "3   Bonarda  red    7");
    assert_eq!(lines[2], "1   Malbec   red    12");
    assert_eq!(lines[3], "Rows 1-2 of 3  [1] 2 » »»");
}

#[test]
fn test_list_second_page() {
    let temp = project();

    crudkit_cmd()
        .current_dir(temp.path())
        .arg("list")
        .arg("wine")
        .arg("--page")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("Torrontes"))
        .stdout(predicate::str::contains("Malbec").not())
        .stdout(predicate::str::contains("Rows 3-3 of 3  «« « 1 [2]"));
}

#[test]
fn test_list_page_with_custom_len() {
    let temp = project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine", "--page", "2", "--len", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Malbec"))
        .stdout(predicate::str::contains("Bonarda").not())
        .stdout(predicate::str::contains("Rows 2-2 of 3"));
}

#[test]
fn test_list_link_round_trips_through_params() {
    let temp = project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine", "--page", "2", "--order", "name desc", "--link"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bonarda"))
        .stdout(predicate::str::contains("?page=2&len=2&order=name+desc"));

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine", "--params", "?page=2&len=2&order=name+desc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bonarda"))
        .stdout(predicate::str::contains("Torrontes").not());
}

#[test]
fn test_list_huge_page_is_empty() {
    let temp = project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine", "--page", "9223372036854775807"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No rows found"));
}

#[test]
fn test_list_len_and_order() {
    let temp = project();

    let output = crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine", "-n", "5", "-o", "price desc"])
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let names: Vec<&str> = stdout
        .lines()
        .skip(1)
        .take(3)
        .filter_map(|line| line.split_whitespace().nth(1))
        .collect();
    assert_eq!(names, vec!["Malbec", "Torrontes", "Bonarda"]);
    assert!(stdout.contains("Rows 1-3 of 3"));
}

#[test]
fn test_list_quick_filter() {
    let temp = project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine", "--filter", "WHITE"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Torrontes"))
        .stdout(predicate::str::contains("Bonarda").not())
        .stdout(predicate::str::contains("Rows 1-1 of 1"));
}

#[test]
fn test_list_structured_query() {
    let temp = project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine", "-q", "price:>8", "-n", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Malbec"))
        .stdout(predicate::str::contains("Torrontes"))
        .stdout(predicate::str::contains("Bonarda").not());
}

#[test]
fn test_list_url_params() {
    let temp = project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine", "--params", "?page=2&order=name%20desc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bonarda"))
        .stdout(predicate::str::contains("Torrontes").not());
}

#[test]
fn test_list_json() {
    let temp = project();

    let output = crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine", "--json"])
        .output()
        .unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert_eq!(rows[0]["name"], "Bonarda");
}

#[test]
fn test_list_with_selection() {
    let temp = project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine", "--select", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[ ]  3   Bonarda"))
        .stdout(predicate::str::contains("[x]  1   Malbec"));
}

#[test]
fn test_list_child_resource() {
    let temp = project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "review", "--parent", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fruity"))
        .stdout(predicate::str::contains("oaky"))
        .stdout(predicate::str::contains("floral").not());
}

#[test]
fn test_parent_on_top_level_resource_fails() {
    let temp = project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine", "--parent", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not nested"));
}

#[test]
fn test_unknown_resource() {
    let temp = project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "beer"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Unknown resource: 'beer'"));
}

#[test]
fn test_count() {
    let temp = project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["count", "wine"])
        .assert()
        .success()
        .stdout("3\n");

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["count", "wine", "-q", "color:red"])
        .assert()
        .success()
        .stdout("2\n");

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["count", "review", "--parent", "2"])
        .assert()
        .success()
        .stdout("1\n");
}
