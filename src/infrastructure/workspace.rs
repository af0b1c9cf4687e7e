//! Project workspace on the file system

use crate::error::{CrudError, Result};
use crate::infrastructure::config::{Config, CONFIG_DIR};
use std::fs;
use std::path::{Path, PathBuf};

/// Abstract access to a crudkit project
pub trait Workspace {
    /// Get the root directory of this project
    fn root(&self) -> &Path;

    /// Load configuration from .crudkit/config.toml
    fn load_config(&self) -> Result<Config>;

    /// Save configuration to .crudkit/config.toml
    fn save_config(&self, config: &Config) -> Result<()>;

    /// Check if .crudkit directory exists
    fn is_initialized(&self) -> bool;

    /// Create .crudkit directory structure
    fn initialize(&self) -> Result<()>;
}

/// File system implementation of Workspace
#[derive(Debug, Clone)]
pub struct FileSystemWorkspace {
    pub root: PathBuf,
}

impl FileSystemWorkspace {
    /// Create a new workspace with the given root directory
    pub fn new(root: PathBuf) -> Self {
        FileSystemWorkspace { root }
    }

    /// Discover the project root by walking up from current directory
    /// First checks CRUDKIT_ROOT environment variable, then falls back to discovery
    pub fn discover() -> Result<Self> {
        if let Ok(root_path) = std::env::var("CRUDKIT_ROOT") {
            let path = PathBuf::from(root_path);
            if Self::has_config_dir(&path) {
                return Ok(FileSystemWorkspace::new(path));
            } else {
                return Err(CrudError::Config(format!(
                    "CRUDKIT_ROOT is set to '{}' but no .crudkit directory found. \
                    Run 'crudkit init' in that directory or unset CRUDKIT_ROOT.",
                    path.display()
                )));
            }
        }

        let current_dir = std::env::current_dir()?;
        Self::discover_from(&current_dir)
    }

    /// Discover the project root by walking up from a specific starting directory
    pub fn discover_from(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();

        loop {
            if Self::has_config_dir(&current) {
                log::debug!("project root: {}", current.display());
                return Ok(FileSystemWorkspace::new(current));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => {
                    return Err(CrudError::NotCrudkitDirectory(start.to_path_buf()));
                }
            }
        }
    }

    fn has_config_dir(path: &Path) -> bool {
        path.join(CONFIG_DIR).is_dir()
    }

    /// Directory of the offline backend for a non-HTTP endpoint.
    pub fn data_dir(&self, endpoint: &str) -> PathBuf {
        let path = Path::new(endpoint);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl Workspace for FileSystemWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }

    fn load_config(&self) -> Result<Config> {
        Config::load_from_dir(&self.root)
    }

    fn save_config(&self, config: &Config) -> Result<()> {
        config.save_to_dir(&self.root)
    }

    fn is_initialized(&self) -> bool {
        Self::has_config_dir(&self.root)
    }

    fn initialize(&self) -> Result<()> {
        let config_dir = self.root.join(CONFIG_DIR);

        if config_dir.exists() {
            return Err(CrudError::Config(format!(
                "Directory already initialized: {}",
                self.root.display()
            )));
        }

        fs::create_dir(&config_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn env_test_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvVarRestore {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvVarRestore {
        fn capture(key: &'static str) -> Self {
            Self {
                key,
                previous: std::env::var_os(key),
            }
        }
    }

    impl Drop for EnvVarRestore {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                std::env::set_var(self.key, value);
            } else {
                std::env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn test_is_initialized() {
        let temp = TempDir::new().unwrap();
        let ws = FileSystemWorkspace::new(temp.path().to_path_buf());

        assert!(!ws.is_initialized());
        ws.initialize().unwrap();
        assert!(ws.is_initialized());
        assert!(temp.path().join(".crudkit").is_dir());
    }

    #[test]
    fn test_initialize_twice_fails() {
        let temp = TempDir::new().unwrap();
        let ws = FileSystemWorkspace::new(temp.path().to_path_buf());

        ws.initialize().unwrap();
        assert!(ws.initialize().is_err());
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".crudkit")).unwrap();

        let subdir = temp.path().join("sub").join("deep");
        fs::create_dir_all(&subdir).unwrap();

        let ws = FileSystemWorkspace::discover_from(&subdir).unwrap();
        assert_eq!(ws.root, temp.path());
    }

    #[test]
    fn test_discover_fails_when_not_initialized() {
        let temp = TempDir::new().unwrap();

        match FileSystemWorkspace::discover_from(temp.path()).unwrap_err() {
            CrudError::NotCrudkitDirectory(_) => {}
            e => panic!("Expected NotCrudkitDirectory error, got {:?}", e),
        }
    }

    #[test]
    fn test_discover_uses_env_root() {
        let _guard = env_test_lock().lock().unwrap();
        let _restore = EnvVarRestore::capture("CRUDKIT_ROOT");

        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".crudkit")).unwrap();
        std::env::set_var("CRUDKIT_ROOT", temp.path());

        let ws = FileSystemWorkspace::discover().unwrap();
        assert_eq!(ws.root, temp.path());
    }

    #[test]
    fn test_discover_rejects_bad_env_root() {
        let _guard = env_test_lock().lock().unwrap();
        let _restore = EnvVarRestore::capture("CRUDKIT_ROOT");

        let temp = TempDir::new().unwrap();
        std::env::set_var("CRUDKIT_ROOT", temp.path());

        let err = FileSystemWorkspace::discover().unwrap_err();
        assert!(err.to_string().contains("CRUDKIT_ROOT"));
    }

    #[test]
    fn test_data_dir() {
        let ws = FileSystemWorkspace::new(PathBuf::from("/projects/shop"));
        assert_eq!(ws.data_dir("data"), PathBuf::from("/projects/shop/data"));
        assert_eq!(ws.data_dir("/srv/data"), PathBuf::from("/srv/data"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let ws = FileSystemWorkspace::new(temp.path().to_path_buf());
        ws.initialize().unwrap();

        let config = Config::new("data");
        ws.save_config(&config).unwrap();

        let loaded = ws.load_config().unwrap();
        assert_eq!(loaded.endpoint, "data");
    }
}
