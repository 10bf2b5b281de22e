//! Tracing setup for the command line tool.

use tracing_subscriber::{EnvFilter, prelude::*};

/// Default filter for a verbosity level.
///
/// `-q` keeps errors only, `-v` adds run events and `-vv` per-partition
/// debug events.
pub fn default_filter(quiet: u8, verbose: u8) -> &'static str {
    match (quiet, verbose) {
        (q, _) if q > 0 => "error",
        (_, 0) => "warn",
        (_, 1) => "logslice=info,warn",
        _ => "logslice=debug,info",
    }
}

/// Install a stderr subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
