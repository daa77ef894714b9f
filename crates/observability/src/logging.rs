//! Tracing subscriber initialization.

use tracing_subscriber::EnvFilter;

use crate::LogFormat;

/// Install the global subscriber, writing to stderr.
///
/// Filtering defaults to `info` and is configurable via `RUST_LOG`. Safe to
/// call multiple times (subsequent calls are no-ops).
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = match format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Text => builder.compact().try_init(),
    };
}
