//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// Defaults to `info` and is overridable via `RUST_LOG`. Safe to call
/// multiple times (subsequent calls are no-ops), so tests and the desktop
/// shell can both call it unconditionally.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Compact human-readable output; a desktop tool's logs are read in a
    // terminal or a support bundle, not shipped to a collector.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(true)
        .try_init();
}
