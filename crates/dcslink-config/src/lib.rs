//! Shared configuration for the dcslink client library and CLI.
//!
//! Values are layered by `ortho_config`: built-in defaults, then a TOML
//! configuration file (`--config-path` or `DCSLINK_CONFIG_PATH`), then
//! `DCSLINK_*` environment variables, then command-line flags.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod endpoint;
mod logging;

pub use defaults::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_MAX_FRAME_BYTES,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_PORT, default_connect_timeout_ms,
    default_host, default_latin1_fallback, default_log_filter, default_log_filter_string,
    default_log_format, default_max_frame_bytes, default_poll_interval_ms, default_port,
};
pub use endpoint::{Endpoint, EndpointParseError};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "DCSLINK")]
pub struct Config {
    /// Simulator host name or address.
    #[serde(default = "defaults::default_host")]
    pub host: String,
    /// Simulator export port.
    #[serde(default = "defaults::default_port")]
    pub port: u16,
    /// Bound on each TCP connect attempt, in milliseconds.
    #[serde(default = "defaults::default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Socket read timeout for the receive loop, in milliseconds.
    #[serde(default = "defaults::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Largest incomplete frame buffered before it is discarded.
    #[serde(default = "defaults::default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Decode non UTF-8 chunks as Latin-1 instead of reporting them.
    #[serde(default = "defaults::default_latin1_fallback")]
    pub latin1_fallback: bool,
    /// `tracing` filter expression.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_frame_bytes: default_max_frame_bytes(),
            latin1_fallback: default_latin1_fallback(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Simulator endpoint assembled from host and port.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// Bound on each TCP connect attempt.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Socket read timeout used by the receive loop. Never zero.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Largest incomplete frame buffered before it is discarded.
    #[must_use]
    pub const fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// Whether non UTF-8 chunks fall back to Latin-1 decoding.
    #[must_use]
    pub const fn latin1_fallback(&self) -> bool {
        self.latin1_fallback
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_local_export_port() {
        let config = Config::default();
        assert_eq!(config.endpoint(), Endpoint::new("127.0.0.1", 7790));
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert!(config.latin1_fallback());
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Compact);
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let config = Config {
            poll_interval_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }
}
