//! CLI layer - Command-line interface

pub mod commands;
pub mod output;

pub use commands::{parse_assignments, Cli, Commands, QueryArgs};
pub use output::{RecordView, Renderable, RowsView};
