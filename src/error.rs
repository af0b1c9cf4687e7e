//! Error types for crudkit

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for crudkit
#[derive(Debug, Error)]
pub enum CrudError {
    #[error("Not a crudkit directory: {0}")]
    NotCrudkitDirectory(PathBuf),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Record not found: {resource}/{id}")]
    RecordNotFound { resource: String, id: String },

    #[error("Permission denied: cannot {action} on '{resource}'")]
    PermissionDenied { resource: String, action: String },

    #[error("Read-only resource: {0}")]
    ReadOnly(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Control error: {0}")]
    Control(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CrudError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CrudError::NotCrudkitDirectory(_) => 2,
            CrudError::UnknownResource(_) => 3,
            CrudError::RecordNotFound { .. } => 4,
            CrudError::PermissionDenied { .. } | CrudError::ReadOnly(_) => 5,
            _ => 1,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn display_with_suggestions(&self) -> String {
        match self {
            CrudError::NotCrudkitDirectory(path) => {
                format!(
                    "Not a crudkit directory: {}\n\n\
                    Suggestions:\n\
                    • Run 'crudkit init --endpoint <url>' in this directory\n\
                    • Navigate to an existing crudkit directory\n\
                    • Set CRUDKIT_ROOT environment variable to your project path",
                    path.display()
                )
            }
            CrudError::UnknownResource(name) => {
                format!(
                    "Unknown resource: '{}'\n\n\
                    Suggestions:\n\
                    • Declare it in .crudkit/config.toml under a [[resource]] table\n\
                    • Resource names are case-insensitive",
                    name
                )
            }
            CrudError::RecordNotFound { resource, id } => {
                format!(
                    "Record not found: {}/{}\n\n\
                    Suggestions:\n\
                    • Use 'crudkit list {}' to see available records",
                    resource, id, resource
                )
            }
            CrudError::PermissionDenied { resource, .. } => {
                format!(
                    "{}\n\n\
                    Suggestions:\n\
                    • Check the grants for '{}' under [permissions] in config.toml\n\
                    • Ask an administrator for access",
                    self, resource
                )
            }
            CrudError::Http(err) => {
                format!(
                    "{}\n\n\
                    Suggestions:\n\
                    • Check that the endpoint is reachable: crudkit config endpoint\n\
                    • Raise the timeout: crudkit config timeout_secs 30",
                    err
                )
            }
            CrudError::Config(msg) => {
                if msg.contains("Unknown config key") {
                    format!(
                        "{}\n\n\
                        Valid keys: endpoint, page_len, pages_to_show, timeout_secs",
                        msg
                    )
                } else {
                    msg.clone()
                }
            }
            _ => self.to_string(),
        }
    }
}

/// Result type using CrudError
pub type Result<T> = std::result::Result<T, CrudError>;
