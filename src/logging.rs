//! Tracing subscriber setup for the numstream binary.
//!
//! Honors `RUST_LOG`; defaults to `numstream=info`. Events go to stderr so
//! they never interleave with the consumer's stdout lines.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Call once at program startup. Safe to call again (subsequent calls are
/// no-ops).
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("numstream=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
