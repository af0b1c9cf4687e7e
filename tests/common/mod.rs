#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::Path;

pub fn crudkit_cmd() -> Command {
    let mut cmd = Command::cargo_bin("crudkit").unwrap();
    cmd.env_remove("CRUDKIT_ROOT");
    cmd.env_remove("CRUDKIT_LOG");
    cmd
}

pub const CONFIG: &str = r#"
endpoint = "data"
page_len = 2
created = "2025-01-17T10:00:00Z"

[menu]
resource = "menu"

[[resource]]
name = "wine"
label = "Wines"
order = "name"

[[resource.schema]]
name = "id"
type = "number"
read_only = true

[[resource.schema]]
name = "name"
type = "string"

[[resource.schema]]
name = "color"
type = "string"
defaults = "red"

[[resource.schema]]
name = "price"
type = "number"

[[resource]]
name = "review"
parent = "wine"
parent_field = "wine_id"

[[resource.schema]]
name = "id"
type = "number"
read_only = true

[[resource.schema]]
name = "wine_id"
type = "number"

[[resource.schema]]
name = "text"
type = "string"
"#;

pub const WINES: &str = r#"[
  {"id": 1, "name": "Malbec", "color": "red", "price": 12},
  {"id": 2, "name": "Torrontes", "color": "white", "price": 9},
  {"id": 3, "name": "Bonarda", "color": "red", "price": 7}
]"#;

pub const REVIEWS: &str = r#"[
  {"id": 1, "wine_id": 1, "text": "fruity"},
  {"id": 2, "wine_id": 2, "text": "floral"},
  {"id": 3, "wine_id": 1, "text": "oaky"}
]"#;

pub const MENU: &str = r##"[
  {"id": 1, "label": "Catalog"},
  {"id": 2, "parent_id": 1, "label": "Wines", "url": "#/wine", "resource": "wine"},
  {"id": 3, "parent_id": 1, "label": "Reviews", "url": "#/review", "resource": "review"}
]"##;

/// Write a project with the given config and the sample data files.
pub fn write_project_with(root: &Path, config: &str) {
    fs::create_dir_all(root.join(".crudkit")).unwrap();
    fs::write(root.join(".crudkit/config.toml"), config).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();
    fs::write(root.join("data/wine.json"), WINES).unwrap();
    fs::write(root.join("data/review.json"), REVIEWS).unwrap();
    fs::write(root.join("data/menu.json"), MENU).unwrap();
}

pub fn write_project(root: &Path) {
    write_project_with(root, CONFIG);
}

pub fn read_rows(root: &Path, resource: &str) -> serde_json::Value {
    let text = fs::read_to_string(root.join("data").join(format!("{}.json", resource))).unwrap();
    serde_json::from_str(&text).unwrap()
}
