//! Error type surfaced by the client API and the error observer.

use std::io;

use thiserror::Error;

use crate::command::CommandError;
use crate::correlator::CorrelationError;
use crate::frame::FrameError;
use crate::transport::ConnectionError;

/// Any failure the client reports.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Socket failure.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    /// Inbound bytes that did not form a response.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// Command rejected before it was queued.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// Query that produced no payload.
    #[error(transparent)]
    Correlation(#[from] CorrelationError),
    /// A worker thread could not be started.
    #[error("failed to spawn the {thread} thread: {source}")]
    Spawn {
        /// Thread name.
        thread: &'static str,
        /// Spawn failure.
        #[source]
        source: io::Error,
    },
    /// A worker thread panicked before it could be joined.
    #[error("{thread} thread panicked")]
    ThreadPanic {
        /// Thread name.
        thread: &'static str,
    },
}

impl ClientError {
    /// Whether the error ended the connection.
    #[must_use]
    pub const fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            Self::Connection(ConnectionError::Send { .. }
                    | ConnectionError::Receive { .. }
                    | ConnectionError::NotConnected)
                | Self::Correlation(CorrelationError::ConnectionLost { .. })
        )
    }
}
