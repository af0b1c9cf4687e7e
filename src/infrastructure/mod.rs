//! Infrastructure layer - Configuration, workspace discovery and REST backends

pub mod config;
pub mod file_backend;
pub mod transport;
pub mod url;
pub mod workspace;

pub use config::{Config, MenuConfig, PermissionsConfig, ResourceDef};
pub use file_backend::FileBackend;
pub use transport::{HttpTransport, Transport};
pub use workspace::{FileSystemWorkspace, Workspace};

use crate::error::Result;

/// Backend for the configured endpoint: HTTP for `http(s)://` URLs,
/// otherwise JSON files in the data directory.
pub fn connect(workspace: &FileSystemWorkspace, config: &Config) -> Result<Box<dyn Transport>> {
    if config.is_remote() {
        log::debug!("using HTTP endpoint {}", config.endpoint);
        return Ok(Box::new(HttpTransport::new(
            &config.endpoint,
            config.timeout_secs,
        )?));
    }

    let dir = workspace.data_dir(&config.endpoint);
    log::debug!("using file backend in {}", dir.display());
    let backend = config
        .resources
        .iter()
        .fold(FileBackend::new(&dir), |backend, resource| {
            backend.with_id_attribute(resource.url(), &resource.id_attribute)
        });
    Ok(Box::new(backend))
}
