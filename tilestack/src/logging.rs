//! Logging setup for tilestack binaries.
//!
//! Structured logging via `tracing`; output goes to stderr so progress
//! bars and summaries own stdout. Level defaults to `info` and is
//! overridable through `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; only the first call installs the
/// subscriber (relevant when tests and a harness both initialize).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
