//! Logging initialization.
//!
//! Events go to stderr so stdout stays reserved for extraction records.
//! `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// HTTP client internals are noisy at debug level.
const QUIET_TARGETS: &str = "hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn";

/// Initialize the logging subsystem at `level`, pretty or JSON.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from `[logging]`, with CLI flag overrides.
pub fn init_from_config(
    config: &docextract_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let level = if verbose_override {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let json_format = json_logs_override || config.logging.format == "json";
    init(level, json_format);
}

fn default_directives(level: &str) -> String {
    format!("{level},{QUIET_TARGETS}")
}
