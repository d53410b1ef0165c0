//! Structured logging setup.
//!
//! `RUST_LOG` wins over the configured level. The subscriber is installed
//! as the thread default for as long as the returned guard lives, so the
//! binary runs on a current-thread runtime.

use probe_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter '{level}': {source}")]
    InvalidLevel {
        level: String,
        #[source]
        source: ParseError,
    },
}

/// Keeps the subscriber installed. Hold it in `main()` until exit.
#[must_use = "logging is uninstalled when the guard drops"]
pub struct LoggingGuard {
    _default: tracing::subscriber::DefaultGuard,
}

fn build_filter(level: &str, env_override: Option<String>) -> Result<EnvFilter, LoggingError> {
    let directives = match env_override {
        Some(env) if !env.trim().is_empty() => env,
        _ => level.to_string(),
    };
    EnvFilter::try_new(&directives).map_err(|source| LoggingError::InvalidLevel {
        level: directives,
        source,
    })
}

pub fn init(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = build_filter(&config.level, std::env::var(EnvFilter::DEFAULT_ENV).ok())?;

    let (pretty, json) = match config.format {
        LogFormat::Pretty => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
        ),
    };

    let default = tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .set_default();

    Ok(LoggingGuard { _default: default })
}
