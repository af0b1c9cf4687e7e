//! Configuration management

use crate::domain::field::{FieldDef, Schema, SchemaEntry};
use crate::domain::menu::MenuAdapter;
use crate::domain::permission::PermissionMap;
use crate::domain::paginator::DEFAULT_PAGES_TO_SHOW;
use crate::domain::query::DEFAULT_LEN;
use crate::error::{CrudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const CONFIG_DIR: &str = ".crudkit";
pub const CONFIG_FILE: &str = "config.toml";

fn default_page_len() -> u64 {
    DEFAULT_LEN
}

fn default_pages_to_show() -> u64 {
    DEFAULT_PAGES_TO_SHOW
}

fn default_true() -> bool {
    true
}

fn default_id_attribute() -> String {
    "id".to_string()
}

fn is_true(value: &bool) -> bool {
    *value
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// `http(s)://` base URL, or a data directory relative to the project root
    pub endpoint: String,
    #[serde(default = "default_page_len")]
    pub page_len: u64,
    #[serde(default = "default_pages_to_show")]
    pub pages_to_show: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "PermissionsConfig::is_empty")]
    pub permissions: PermissionsConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<MenuConfig>,
    #[serde(default, rename = "resource", skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceDef>,
}

/// Where the session's permissions come from.
///
/// With a `template`, permissions are fetched from the URL it expands to.
/// Otherwise `grants` plus the full access given by each of the user's
/// `roles` are used. When nothing is set, every resource is allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_roles: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub grants: PermissionMap,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub roles: BTreeMap<String, Vec<String>>,
}

impl PermissionsConfig {
    pub fn is_empty(&self) -> bool {
        self.template.is_none() && self.grants.is_empty() && self.roles.is_empty()
    }

    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or("anonymous")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuConfig {
    /// Resource the menu records are listed from
    pub resource: String,
    #[serde(default)]
    pub attributes: MenuAdapter,
}

/// A REST resource and its field schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub fetch_total: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fetch_on_edit: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_schema: Option<Vec<SchemaEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_schema: Option<Vec<SchemaEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_schema: Option<Vec<SchemaEntry>>,
    #[serde(default)]
    pub schema: Vec<FieldDef>,
}

impl ResourceDef {
    pub fn new(name: &str, schema: Vec<FieldDef>) -> Self {
        ResourceDef {
            name: name.to_string(),
            label: None,
            url: None,
            id_attribute: default_id_attribute(),
            fetch_total: true,
            fetch_on_edit: false,
            read_only: false,
            filter_by: None,
            order: None,
            base_query: None,
            parent: None,
            parent_field: None,
            table_schema: None,
            form_schema: None,
            query_schema: None,
            schema,
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Path of the resource below the endpoint.
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.name)
    }

    pub fn schema(&self) -> Result<Schema> {
        Schema::new(&self.schema)
    }

    pub fn table_schema(&self) -> Result<Schema> {
        self.derived(self.table_schema.as_deref())
    }

    pub fn form_schema(&self) -> Result<Schema> {
        self.derived(self.form_schema.as_deref())
    }

    pub fn query_schema(&self) -> Result<Schema> {
        self.derived(self.query_schema.as_deref())
    }

    fn derived(&self, entries: Option<&[SchemaEntry]>) -> Result<Schema> {
        match entries {
            Some(entries) => Schema::new(&Schema::extend(entries, &self.schema)?),
            None => self.schema(),
        }
    }

    /// Quick-filter fields: the explicit override, else the table schema's.
    pub fn filter_by(&self) -> Result<String> {
        match &self.filter_by {
            Some(filter_by) => Ok(filter_by.clone()),
            None => Ok(self.table_schema()?.filter_by()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CrudError::Config("resource.name not specified".to_string()));
        }
        let context = |e: CrudError| {
            CrudError::Config(format!("resource '{}': {}", self.name, e))
        };
        self.schema().map_err(context)?;
        self.table_schema().map_err(context)?;
        self.form_schema().map_err(context)?;
        self.query_schema().map_err(context)?;
        if self.parent.is_some() && self.parent_field.is_none() {
            return Err(CrudError::Config(format!(
                "resource '{}': parent needs parent_field",
                self.name
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Create a new config with default values
    pub fn new(endpoint: &str) -> Self {
        Config {
            endpoint: endpoint.to_string(),
            page_len: DEFAULT_LEN,
            pages_to_show: DEFAULT_PAGES_TO_SHOW,
            timeout_secs: None,
            created: Utc::now(),
            permissions: PermissionsConfig::default(),
            menu: None,
            resources: Vec::new(),
        }
    }

    /// Load config from .crudkit/config.toml in the given directory
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(CONFIG_DIR).join(CONFIG_FILE);

        let contents = fs::read_to_string(&config_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CrudError::NotCrudkitDirectory(path.to_path_buf())
            } else {
                CrudError::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| CrudError::Config(format!("Failed to parse config.toml: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to .crudkit/config.toml in the given directory
    pub fn save_to_dir(&self, path: &Path) -> Result<()> {
        let config_dir = path.join(CONFIG_DIR);
        let config_path = config_dir.join(CONFIG_FILE);

        if !config_dir.exists() {
            fs::create_dir(&config_dir)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CrudError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Check resources, schemas and parent links.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(CrudError::Config("endpoint not specified".to_string()));
        }
        for (i, resource) in self.resources.iter().enumerate() {
            resource.validate()?;
            let duplicate = self.resources[..i]
                .iter()
                .any(|r| r.name.eq_ignore_ascii_case(&resource.name));
            if duplicate {
                return Err(CrudError::Config(format!(
                    "resource '{}' declared twice",
                    resource.name
                )));
            }
            if let Some(parent) = &resource.parent {
                if self.find_resource(parent).is_none() {
                    return Err(CrudError::Config(format!(
                        "resource '{}': parent '{}' is not declared",
                        resource.name, parent
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn find_resource(&self, name: &str) -> Option<&ResourceDef> {
        self.resources
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Look up a resource by name, ignoring case.
    pub fn resource(&self, name: &str) -> Result<&ResourceDef> {
        self.find_resource(name)
            .ok_or_else(|| CrudError::UnknownResource(name.to_string()))
    }

    /// Whether the endpoint is a remote HTTP server.
    pub fn is_remote(&self) -> bool {
        self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
endpoint = "data"
page_len = 5
created = "2025-01-17T10:00:00Z"

[permissions]
user = "jdoe"
user_roles = ["Admin-Catalog"]

[permissions.grants]
country = ["consulta"]

[permissions.roles]
admin-catalog = ["Wine"]

[menu]
resource = "menu"

[[resource]]
name = "wine"
label = "Wines"
table_schema = ["id", "name", { name = "country", label = "From" }]

[[resource.schema]]
name = "id"
type = "number"
read_only = true

[[resource.schema]]
name = "name"
type = "string"

[[resource.schema]]
name = "country"
type = "string"
options = ["AR", "FR"]

[[resource]]
name = "review"
parent = "wine"
parent_field = "wine_id"

[[resource.schema]]
name = "wine_id"
type = "number"
"#;

    fn write_sample(dir: &Path, contents: &str) {
        fs::create_dir_all(dir.join(CONFIG_DIR)).unwrap();
        fs::write(dir.join(CONFIG_DIR).join(CONFIG_FILE), contents).unwrap();
    }

    #[test]
    fn test_new_config() {
        let config = Config::new("http://localhost/api");
        assert_eq!(config.page_len, 10);
        assert_eq!(config.pages_to_show, 3);
        assert!(config.is_remote());
        assert!(config.permissions.is_empty());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::new("data");
        config.timeout_secs = Some(15);
        config.resources.push(ResourceDef::new(
            "wine",
            vec![FieldDef::new("name", crate::domain::FieldType::String)],
        ));

        config.save_to_dir(temp.path()).unwrap();
        assert!(temp.path().join(".crudkit/config.toml").exists());

        let loaded = Config::load_from_dir(temp.path()).unwrap();
        assert_eq!(loaded, config);
        assert!(!loaded.is_remote());
    }

    #[test]
    fn test_load_missing_config() {
        let temp = TempDir::new().unwrap();

        let result = Config::load_from_dir(temp.path());

        match result.unwrap_err() {
            CrudError::NotCrudkitDirectory(_) => {}
            e => panic!("Expected NotCrudkitDirectory error, got {:?}", e),
        }
    }

    #[test]
    fn test_load_sample() {
        let temp = TempDir::new().unwrap();
        write_sample(temp.path(), SAMPLE);

        let config = Config::load_from_dir(temp.path()).unwrap();
        assert_eq!(config.page_len, 5);
        assert_eq!(config.pages_to_show, 3);
        assert_eq!(config.permissions.user(), "jdoe");
        assert_eq!(config.menu.as_ref().unwrap().attributes.label, "label");

        let wine = config.resource("WINE").unwrap();
        assert_eq!(wine.label(), "Wines");
        assert_eq!(wine.url(), "wine");
        assert!(wine.fetch_total);

        let table = wine.table_schema().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.find_by_name("country").unwrap().label, "From");
        assert_eq!(wine.filter_by().unwrap(), "id,name,country");

        assert!(matches!(
            config.resource("grape"),
            Err(CrudError::UnknownResource(_))
        ));
    }

    #[test]
    fn test_unknown_control_fails_at_load() {
        let temp = TempDir::new().unwrap();
        write_sample(
            temp.path(),
            r#"
endpoint = "data"
created = "2025-01-17T10:00:00Z"

[[resource]]
name = "wine"

[[resource.schema]]
name = "name"
control = "slider"
"#,
        );
        let err = Config::load_from_dir(temp.path()).unwrap_err();
        assert!(err.to_string().contains("slider"));
    }

    #[test]
    fn test_unknown_parent_fails_at_load() {
        let temp = TempDir::new().unwrap();
        write_sample(
            temp.path(),
            r#"
endpoint = "data"
created = "2025-01-17T10:00:00Z"

[[resource]]
name = "review"
parent = "wine"
parent_field = "wine_id"
"#,
        );
        assert!(matches!(
            Config::load_from_dir(temp.path()),
            Err(CrudError::Config(_))
        ));
    }
}
