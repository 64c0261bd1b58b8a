//! Tracing subscriber setup.

use crate::config::LoggingConfig;
use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Install the global subscriber. Logs go to stderr so JSON Lines output on
/// stdout stays clean.
///
/// `RUST_LOG` takes precedence over `config.level`. Calling this more than
/// once is a no-op.
pub fn init(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config);

        let registry = tracing_subscriber::registry().with(filter);
        let result = if config.json {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .try_init()
        };

        if let Err(e) = result {
            eprintln!("Warning: tracing subscriber already installed: {e}");
        }
    });
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
