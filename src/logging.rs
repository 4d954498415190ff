//! Logging setup via `tracing-subscriber`
//!
//! Available when the `tracing` feature is enabled (it is by default).

use tracing_subscriber::EnvFilter;

/// Initialize a formatted `tracing` subscriber with the given filter
///
/// The filter accepts standard `EnvFilter` directives ("info",
/// "kdekom=debug", ...). Falls back to "info" if the directive does not
/// parse. Safe to call more than once: subsequent calls are no-ops.
pub fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
