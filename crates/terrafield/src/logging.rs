//! Log filtering for binaries.
//!
//! Libraries never install a subscriber. Binaries build their filter here
//! so `RUST_LOG` accepts the full directive syntax, per-crate targets
//! included (`RUST_LOG=terrafield_procedural=trace`).

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVES: &str = "info";

/// Filter built from `RUST_LOG`, falling back to [`DEFAULT_DIRECTIVES`].
#[must_use]
pub fn env_filter() -> EnvFilter {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
}

/// Filter built from `directives`, falling back to [`DEFAULT_DIRECTIVES`]
/// when they are absent or invalid.
#[must_use]
pub fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}
