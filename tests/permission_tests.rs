//! Integration tests for permissions and the menu

#![allow(deprecated)]

use predicates::prelude::*;
use tempfile::TempDir;

mod common;
use common::{crudkit_cmd, write_project, write_project_with, CONFIG};

fn restricted_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let config = CONFIG.replace(
        "[menu]",
        "[permissions]\nuser = \"jdoe\"\n\n[permissions.grants]\nwine = [\"read\"]\n\n[menu]",
    );
    write_project_with(temp.path(), &config);
    temp
}

#[test]
fn test_read_grant_allows_listing() {
    let temp = restricted_project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bonarda"));
}

#[test]
fn test_read_only_resource_refuses_writes() {
    let temp = restricted_project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["create", "wine", "name=Syrah"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Read-only resource: wine"));

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["update", "wine", "1", "price=1"])
        .assert()
        .code(5);

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["delete", "wine", "1"])
        .assert()
        .code(5);
}

#[test]
fn test_ungranted_resource_is_denied() {
    let temp = restricted_project();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "review", "--parent", "1"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Permission denied"));
}

#[test]
fn test_roles_grant_full_access() {
    let temp = TempDir::new().unwrap();
    let config = CONFIG.replace(
        "[menu]",
        "[permissions]\nuser = \"jdoe\"\nuser_roles = [\"editor\"]\n\n\
         [permissions.roles]\neditor = [\"review\"]\n\n[menu]",
    );
    write_project_with(temp.path(), &config);

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["create", "review", "text=balanced", "--parent", "3"])
        .assert()
        .success();

    crudkit_cmd()
        .current_dir(temp.path())
        .args(["list", "wine"])
        .assert()
        .code(5);
}

#[test]
fn test_menu_unrestricted() {
    let temp = TempDir::new().unwrap();
    write_project(temp.path());

    crudkit_cmd()
        .current_dir(temp.path())
        .arg("menu")
        .assert()
        .success()
        .stdout("Catalog\n  Wines  #/wine\n  Reviews  #/review\n");
}

#[test]
fn test_menu_pruned_by_permissions() {
    let temp = restricted_project();

    crudkit_cmd()
        .current_dir(temp.path())
        .arg("menu")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wines"))
        .stdout(predicate::str::contains("Reviews").not());
}
