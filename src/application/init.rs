//! Initialize project use case

use crate::error::Result;
use crate::infrastructure::{Config, FileSystemWorkspace, Workspace};
use std::fs;
use std::path::Path;

/// Default endpoint: JSON files under `data/` in the project.
pub const DEFAULT_ENDPOINT: &str = "data";

/// Initialize a new project at `path` talking to `endpoint`.
///
/// A non-HTTP endpoint is a data directory for the offline backend and is
/// created along with `.crudkit/`.
pub fn init(path: &Path, endpoint: &str) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }

    let workspace = FileSystemWorkspace::new(path.to_path_buf());
    workspace.initialize()?;

    let config = Config::new(endpoint);
    config.validate()?;
    workspace.save_config(&config)?;

    println!("Initialized crudkit project at {}", path.display());
    if config.is_remote() {
        println!("Endpoint: {}", endpoint);
    } else {
        let data_dir = workspace.data_dir(endpoint);
        fs::create_dir_all(&data_dir)?;
        println!("Endpoint: {} (offline, {})", endpoint, data_dir.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrudError;
    use tempfile::TempDir;

    #[test]
    fn test_init_offline_creates_data_dir() {
        let temp = TempDir::new().unwrap();
        init(temp.path(), DEFAULT_ENDPOINT).unwrap();

        assert!(temp.path().join(".crudkit/config.toml").is_file());
        assert!(temp.path().join("data").is_dir());
        let config = Config::load_from_dir(temp.path()).unwrap();
        assert_eq!(config.endpoint, "data");
        assert_eq!(config.page_len, 10);
    }

    #[test]
    fn test_init_remote_has_no_data_dir() {
        let temp = TempDir::new().unwrap();
        init(temp.path(), "http://localhost:8080/api").unwrap();
        assert!(!temp.path().join("data").exists());
    }

    #[test]
    fn test_init_twice_fails() {
        let temp = TempDir::new().unwrap();
        init(temp.path(), DEFAULT_ENDPOINT).unwrap();
        assert!(matches!(
            init(temp.path(), DEFAULT_ENDPOINT),
            Err(CrudError::Config(_))
        ));
    }

    #[test]
    fn test_init_rejects_empty_endpoint() {
        let temp = TempDir::new().unwrap();
        assert!(init(temp.path(), " ").is_err());
    }
}
