//! crudkit - CRUD client for REST resources
//!
//! Lists, filters, pages and edits the resources of a REST endpoint, or of
//! an offline directory of JSON files, driven by field schemas declared in
//! `.crudkit/config.toml` and gated by per-user permissions.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;

pub use error::CrudError;
