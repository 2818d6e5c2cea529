//! Built-in defaults applied when no configuration layer sets a value.

use crate::logging::LogFormat;

/// Default simulator host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default simulator export port.
pub const DEFAULT_PORT: u16 = 7790;

/// Default bound on a single TCP connect attempt, in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Default socket read timeout used by the receive loop, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Largest incomplete frame the decoder buffers before discarding it.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default simulator host.
#[must_use]
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Default simulator export port.
#[must_use]
pub const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default connect timeout in milliseconds.
#[must_use]
pub const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default receive poll interval in milliseconds.
#[must_use]
pub const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Default frame size bound in bytes.
#[must_use]
pub const fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}

/// Latin-1 decoding of non UTF-8 chunks is enabled unless configured off.
#[must_use]
pub const fn default_latin1_fallback() -> bool {
    true
}

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::default()
}
