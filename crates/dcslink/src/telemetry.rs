//! Global `tracing` subscriber for programs embedding the client.

use std::io::{self, IsTerminal};

use dcslink_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

static SUBSCRIBER_INSTALLED: OnceCell<()> = OnceCell::new();

/// Proof that logging is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Failures while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `log_filter` is not a valid `EnvFilter` directive.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs a stderr subscriber built from `config` on the first call.
///
/// Later calls return a handle without touching the installed subscriber,
/// even when `config` differs.
///
/// ```rust
/// use dcslink::telemetry;
/// use dcslink_config::Config;
///
/// # fn main() -> Result<(), telemetry::TelemetryError> {
/// let config = Config::default();
/// telemetry::initialise(&config)?;
/// telemetry::initialise(&config)?;
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    SUBSCRIBER_INSTALLED
        .get_or_try_init(|| install(config))
        .map(|()| TelemetryHandle)
}

fn install(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_filters_before_installing() {
        let config = Config {
            log_filter: "dcslink=[".to_owned(),
            ..Config::default()
        };
        assert!(matches!(install(&config), Err(TelemetryError::Filter(_))));
    }
}
