//! CLI command definitions

use crate::domain::query::ListParams;
use crate::error::{CrudError, Result};
use crate::infrastructure::url::list_params;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "crudkit")]
#[command(about = "Browse and edit REST resources from the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new project
    Init {
        /// Directory to initialize (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// REST base URL, or a data directory for offline JSON files
        #[arg(short, long, default_value = "data")]
        endpoint: String,
    },

    /// View or modify configuration
    Config {
        /// Config key to get or set
        key: Option<String>,

        /// Value to set (if provided, sets the key)
        value: Option<String>,

        /// List all configuration
        #[arg(short, long)]
        list: bool,
    },

    /// List one page of a resource
    List {
        resource: String,

        #[command(flatten)]
        query: QueryArgs,

        /// Ids to mark as selected (comma-separated)
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,

        /// Parent id, for resources nested under another one
        #[arg(long)]
        parent: Option<String>,

        /// Print the rows as JSON
        #[arg(long)]
        json: bool,

        /// Also print the view as a query string, reusable with --params
        #[arg(long)]
        link: bool,
    },

    /// Count the rows matching a query
    Count {
        resource: String,

        #[command(flatten)]
        query: QueryArgs,

        /// Parent id, for resources nested under another one
        #[arg(long)]
        parent: Option<String>,
    },

    /// Show one record
    Show {
        resource: String,

        id: String,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a record from FIELD=VALUE pairs
    Create {
        resource: String,

        #[arg(value_name = "FIELD=VALUE")]
        fields: Vec<String>,

        /// Parent id, for resources nested under another one
        #[arg(long)]
        parent: Option<String>,
    },

    /// Update a record from FIELD=VALUE pairs
    Update {
        resource: String,

        id: String,

        #[arg(value_name = "FIELD=VALUE", required = true)]
        fields: Vec<String>,
    },

    /// Delete one or more records
    Delete {
        resource: String,

        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Describe the form of a resource
    Form { resource: String },

    /// Show the navigation menu
    Menu,
}

/// Listing options shared by `list` and `count`.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Page number, starting at 1
    #[arg(short, long)]
    pub page: Option<String>,

    /// Rows per page
    #[arg(short = 'n', long)]
    pub len: Option<String>,

    /// Order, e.g. "name desc,id"
    #[arg(short, long)]
    pub order: Option<String>,

    /// Quick filter text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Structured query, e.g. "price:>10,color:red"
    #[arg(short, long)]
    pub query: Option<String>,

    /// URL-style parameters, e.g. "page=2&order=name"
    #[arg(long)]
    pub params: Option<String>,
}

impl QueryArgs {
    /// Explicit options win over the ones given through `--params`.
    pub fn to_list_params(&self) -> ListParams {
        let mut params = self
            .params
            .as_deref()
            .map(|p| list_params(p.trim_start_matches('?')))
            .unwrap_or_default();
        params.merge(ListParams {
            page: self.page.clone(),
            len: self.len.clone(),
            order: self.order.clone(),
            filter: self.filter.clone(),
            query: self.query.clone(),
            ..Default::default()
        });
        params
    }
}

/// Split `FIELD=VALUE` arguments.
pub fn parse_assignments(fields: &[String]) -> Result<Vec<(String, String)>> {
    fields
        .iter()
        .map(|field| match field.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.to_string()))
            }
            _ => Err(CrudError::InvalidInput(format!(
                "expected FIELD=VALUE, got '{}'",
                field
            ))),
        })
        .collect()
}
