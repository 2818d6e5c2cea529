//! Errors delivered to callers waiting on a query.

use std::time::Duration;

use thiserror::Error;

use super::QueryKey;

/// Why a query produced no payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    /// No response arrived in time. The entry has been removed.
    #[error("no response to {key} within {timeout:?}")]
    Timeout {
        /// Query that went unanswered.
        key: QueryKey,
        /// How long the caller waited.
        timeout: Duration,
    },
    /// The simulator reported an error for the command.
    #[error("command {id} failed in the simulator: {message}")]
    Remote {
        /// Command id.
        id: u32,
        /// `error_message` sent by the simulator.
        message: String,
    },
    /// The connection closed before the response arrived.
    #[error("connection lost before {key} was answered")]
    ConnectionLost {
        /// Query that was waiting.
        key: QueryKey,
    },
    /// The response could not be decoded.
    #[error("response to {key} was lost to a decoding error")]
    ResponseLost {
        /// Query whose response was discarded.
        key: QueryKey,
    },
    /// An identical query is already waiting.
    #[error("{key} is already pending")]
    AlreadyPending {
        /// Key of the waiting query.
        key: QueryKey,
    },
}
