//! Config management use case

use crate::error::{CrudError, Result};
use crate::infrastructure::{Config, FileSystemWorkspace, Workspace};

/// Keys readable and writable through `crudkit config`.
pub const KEYS: &[&str] = &["endpoint", "page_len", "pages_to_show", "timeout_secs", "created"];

/// Service for managing project configuration
pub struct ConfigService {
    workspace: FileSystemWorkspace,
}

impl ConfigService {
    /// Create a new config service
    pub fn new(workspace: FileSystemWorkspace) -> Self {
        ConfigService { workspace }
    }

    /// Get a single config value
    pub fn get(&self, key: &str) -> Result<String> {
        let config = self.workspace.load_config()?;

        match key {
            "endpoint" => Ok(config.endpoint.clone()),
            "page_len" => Ok(config.page_len.to_string()),
            "pages_to_show" => Ok(config.pages_to_show.to_string()),
            "timeout_secs" => Ok(config
                .timeout_secs
                .map(|secs| secs.to_string())
                .unwrap_or_default()),
            "created" => Ok(config.created.to_rfc3339()),
            _ => Err(unknown_key(key)),
        }
    }

    /// Set a config value
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.workspace.load_config()?;

        match key {
            "endpoint" => {
                config.endpoint = value.trim().to_string();
            }
            "page_len" => {
                config.page_len = positive(key, value)?;
            }
            "pages_to_show" => {
                config.pages_to_show = positive(key, value)?;
            }
            "timeout_secs" => {
                config.timeout_secs = if value.trim().is_empty() {
                    None
                } else {
                    Some(positive(key, value)?)
                };
            }
            "created" => {
                return Err(CrudError::Config(
                    "Cannot modify 'created' field (read-only)".to_string(),
                ));
            }
            _ => return Err(unknown_key(key)),
        }

        config.validate()?;
        self.workspace.save_config(&config)?;
        log::info!("config {} set to '{}'", key, value);
        Ok(())
    }

    /// List all config values
    pub fn list(&self) -> Result<Config> {
        self.workspace.load_config()
    }
}

fn positive(key: &str, value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CrudError::Config(format!(
            "Invalid value for '{}': '{}' (expected a positive integer)",
            key, value
        ))),
    }
}

fn unknown_key(key: &str) -> CrudError {
    CrudError::Config(format!("Unknown config key: '{}'", key))
}
