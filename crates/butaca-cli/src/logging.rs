//! Tracing subscriber setup

use crate::config::CliConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. Logs go to stderr so stdout stays
/// parseable. `RUST_LOG` overrides the verbosity-derived filter.
pub fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()));

    let registry = tracing_subscriber::registry().with(filter);
    // a second init (e.g. in tests) keeps the first subscriber
    let _ = if config.json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(config.color.should_color())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}
