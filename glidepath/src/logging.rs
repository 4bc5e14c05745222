//! Standardized logging setup, shared by the CLI binary and by tests that
//! want readable output. `RUST_LOG` controls the filter; defaults to INFO.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Human-readable output for a terminal.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// JSON output, for when a deployment ships logs to an aggregator rather
/// than a terminal.
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init();
}
