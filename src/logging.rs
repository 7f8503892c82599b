//! Sets up the tracing subscriber used by the binaries.

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log to stderr, filtered by `RUST_LOG` or `default_directive` if it is not
/// set (e.g. `"info"` or `"bookkeeper=debug"`).
///
/// Logs go to stderr so they do not mix with the client's output.
pub fn setup_logging(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let stderr_log = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(filter))
        .init();
}
