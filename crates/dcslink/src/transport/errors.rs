//! Error types for the simulator connection.

use std::io;

use thiserror::Error;

/// Errors surfaced while connecting to, writing to, or reading from the socket.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Host name lookup failed.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        /// Configured endpoint.
        endpoint: String,
        /// Resolver failure.
        #[source]
        source: io::Error,
    },
    /// Lookup succeeded without any address.
    #[error("no addresses resolved for {endpoint}")]
    ResolveEmpty {
        /// Configured endpoint.
        endpoint: String,
    },
    /// Every resolved address refused or timed out.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        /// Configured endpoint.
        endpoint: String,
        /// Last connect failure.
        #[source]
        source: io::Error,
    },
    /// `connect` called while connected or connecting.
    #[error("a connection is already open or being opened")]
    AlreadyConnected,
    /// The operation needs a live connection.
    #[error("not connected to the simulator")]
    NotConnected,
    /// Writing a frame failed; the session ends.
    #[error("failed to write to the simulator: {source}")]
    Send {
        /// Write failure.
        #[source]
        source: io::Error,
    },
    /// Reading failed; the session ends.
    #[error("failed to read from the simulator: {source}")]
    Receive {
        /// Read failure.
        #[source]
        source: io::Error,
    },
    /// Socket options could not be applied.
    #[error("failed to configure the socket: {source}")]
    Configure {
        /// Option failure.
        #[source]
        source: io::Error,
    },
}
