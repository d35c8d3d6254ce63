//! Structured logging setup.
//!
//! Events go to stderr so stdout carries only command output. `RUST_LOG`
//! overrides the configured level.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing(config: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { config.level.as_str() };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!(
            level = default_level,
            json_format = config.json,
            "logging initialized"
        );
    }
}
