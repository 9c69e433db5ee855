//! Tracing Initialization
//!
//! One-line setup for structured logging. The filter comes from `RUST_LOG`
//! when set, otherwise defaults to `info`.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber
///
/// Safe to call more than once; subsequent calls are no-ops. Intended for
/// binaries and integration tests, not library code.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
