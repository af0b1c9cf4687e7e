//! Application layer - Use cases and orchestration

pub mod child;
pub mod collection;
pub mod crud;
pub mod init;
pub mod manage_config;
pub mod menu;
pub mod session;

pub use child::CrudChildController;
pub use collection::{Paginatable, RemoteCollection};
pub use crud::{BulkOutcome, CrudController, Mode, Notice};
pub use manage_config::ConfigService;
pub use menu::load_menu;
pub use session::{open_session, RemoteSource, StaticSource};
