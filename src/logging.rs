//! Log filter construction for the stderr and JSON file layers.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Builds a filter from directive text, falling back to `default` when the
/// text names no directives. Invalid directives are skipped.
pub fn filter_from(directives: Option<&str>, default: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .parse_lossy(directives.unwrap_or_default())
}

/// Builds a filter from the environment variable `var`, e.g. `RUST_LOG`.
pub fn env_filter(var: &str, default: LevelFilter) -> EnvFilter {
    filter_from(std::env::var(var).ok().as_deref(), default)
}
