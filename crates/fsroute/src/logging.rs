// File: src/logging.rs
// Purpose: tracing subscriber setup and the per-server span

use tracing::Span;
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to `level`
///
/// Safe to call more than once: later calls leave the first subscriber in place.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Span carried by one server instance; every lifecycle log line runs inside it
pub fn server_span(routes_dir: &std::path::Path) -> Span {
    tracing::info_span!("fsroute", routes_dir = %routes_dir.display())
}
