//! Structured logging initialization.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::TelemetryResult;

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON lines with span context, for log shipping in production.
    Json,
    /// Human-readable output for local development.
    Pretty,
}

impl LogFormat {
    /// Pick a format from the `RUST_ENV` convention: `production` means
    /// JSON, anything else (or unset) means pretty.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var("RUST_ENV").ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("production") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Initialize tracing with the format taken from the environment.
///
/// The default filter quiets foreign crates to `info` and keeps the pmq
/// crates at `debug`; a set `RUST_LOG` replaces it entirely.
pub fn init_logging() -> TelemetryResult<()> {
    init_logging_with(LogFormat::from_env())
}

/// Initialize tracing with an explicit format.
pub fn init_logging_with(format: LogFormat) -> TelemetryResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,pmq=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true),
                )
                .init();
        }
        LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_thread_names(true),
                )
                .init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_env_value() {
        assert_eq!(
            LogFormat::from_env_value(Some("production")),
            LogFormat::Json
        );
        assert_eq!(LogFormat::from_env_value(Some("staging")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_env_value(None), LogFormat::Pretty);
    }
}
