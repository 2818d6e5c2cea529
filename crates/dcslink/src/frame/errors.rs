//! Errors raised while turning socket bytes into frames.

use std::str::Utf8Error;

use thiserror::Error;

/// Failures surfaced by [`FrameDecoder`](super::FrameDecoder) and envelope
/// conversion. Each one leaves the decoder empty and ready for new input.
#[derive(Debug, Error)]
pub enum FrameError {
    /// A chunk was not valid UTF-8 and the Latin-1 fallback is disabled.
    #[error("received {len} bytes that are not valid UTF-8: {source}")]
    Decode {
        /// Size of the rejected chunk.
        len: usize,
        /// Position of the first invalid byte.
        #[source]
        source: Utf8Error,
    },
    /// Buffered text is not valid JSON; the whole buffer was dropped.
    #[error("discarded {discarded} buffered bytes of malformed JSON: {source}")]
    Malformed {
        /// Bytes dropped from the buffer.
        discarded: usize,
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },
    /// An incomplete frame grew past the configured bound.
    #[error("discarded incomplete frame of {len} bytes exceeding the {limit} byte limit")]
    Oversized {
        /// Bytes dropped from the buffer.
        len: usize,
        /// Configured bound.
        limit: usize,
    },
    /// A complete JSON value that is not a response envelope.
    #[error("frame is not a response envelope: {source}")]
    Envelope {
        /// Why the value could not be read as an envelope.
        #[source]
        source: serde_json::Error,
    },
}
