//! Log output.
//!
//! Diagnostics go to stderr so they never mix with a CGI response on stdout.
//! `WAYPOST_LOG` takes `EnvFilter` directives (`debug`,
//! `waypost_dispatch=trace`, ...); without it only warnings are shown, or
//! everything at `debug` in debug mode.

use tracing_subscriber::EnvFilter;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "WAYPOST_LOG";

/// Builds the filter from [`LOG_ENV`], falling back to `default_directive`.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Installs the global subscriber. Returns `false` if one was already set.
pub fn init(debug: bool) -> bool {
    let default_directive = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
