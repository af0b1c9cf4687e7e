//! Logging setup
//!
//! Log lines go to stderr so command output on stdout stays parseable.
//! `CRUDKIT_LOG` takes env_logger filter syntax and wins over `-v`.

use log::LevelFilter;

pub const LOG_ENV: &str = "CRUDKIT_LOG";

/// Level for a `-v` count: warn, info, debug, then trace.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initialize the global logger once. Later calls are ignored.
pub fn init(verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level_for(verbosity))
        .filter_module("reqwest", LevelFilter::Warn)
        .target(env_logger::Target::Stderr)
        .format_timestamp(None);

    if let Ok(filters) = std::env::var(LOG_ENV) {
        builder.parse_filters(&filters);
    }

    let _ = builder.try_init();
}
