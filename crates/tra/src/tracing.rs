//! Process-wide log subscriber for the `tra` binary and its tests.
//!
//! Logs go to stderr so the JSON report on stdout stays machine-readable.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the subscriber, filtering at `default_level` unless `RUST_LOG` is set.
///
/// Lines are compact and omit the module target. Only the first call in a
/// process installs anything; it returns `true`, and later calls return
/// `false` and keep the existing filter.
pub fn init_with_filter(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
