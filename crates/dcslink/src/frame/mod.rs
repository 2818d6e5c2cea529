//! Incremental JSON frame extraction over the socket byte stream.
//!
//! Frames are concatenated JSON values, usually newline separated. The
//! decoder keeps whatever is left of an incomplete frame for the next chunk
//! and drops the whole buffer when the text cannot be JSON at all; it does
//! not try to resynchronise on a later frame boundary.

mod envelope;
mod errors;

use std::mem;

use tracing::warn;

pub use envelope::{EchoedParameter, ResponseEnvelope};
pub use errors::FrameError;

const FRAME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::frame");

/// Accumulates decoded text and yields complete JSON values.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: String,
    /// Trailing bytes of a UTF-8 sequence split across chunks.
    carry: Vec<u8>,
    latin1_fallback: bool,
    max_frame_bytes: usize,
}

impl FrameDecoder {
    /// Creates a decoder.
    ///
    /// With `latin1_fallback` set, a chunk that is not UTF-8 is decoded as
    /// Latin-1 instead of being rejected. Incomplete frames larger than
    /// `max_frame_bytes` are discarded.
    #[must_use]
    pub const fn new(latin1_fallback: bool, max_frame_bytes: usize) -> Self {
        Self {
            buffer: String::new(),
            carry: Vec::new(),
            latin1_fallback,
            max_frame_bytes,
        }
    }

    /// Appends a chunk and returns every frame it completes, in order.
    ///
    /// Errors are interleaved with frames at the point they occurred.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Result<serde_json::Value, FrameError>> {
        let mut out = Vec::new();
        if let Err(error) = self.append(bytes) {
            out.push(Err(error));
            return out;
        }
        self.drain_frames(&mut out);
        out
    }

    /// Bytes of text waiting for the rest of a frame.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len() + self.carry.len()
    }

    /// Drops buffered text and any partial UTF-8 sequence.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.carry.clear();
    }

    fn append(&mut self, bytes: &[u8]) -> Result<(), FrameError> {
        let mut pending = mem::take(&mut self.carry);
        pending.extend_from_slice(bytes);

        match std::str::from_utf8(&pending) {
            Ok(text) => {
                self.buffer.push_str(text);
                Ok(())
            }
            // Only the tail is incomplete: keep it for the next chunk.
            Err(error) if error.error_len().is_none() => {
                let (complete, tail) = pending.split_at(error.valid_up_to());
                self.buffer.push_str(&String::from_utf8_lossy(complete));
                self.carry = tail.to_vec();
                Ok(())
            }
            Err(_) if self.latin1_fallback => {
                self.buffer.extend(pending.iter().copied().map(char::from));
                Ok(())
            }
            Err(source) => {
                warn!(
                    target: FRAME_TARGET,
                    len = pending.len(),
                    error = %source,
                    "dropping chunk that is not valid UTF-8"
                );
                Err(FrameError::Decode {
                    len: pending.len(),
                    source,
                })
            }
        }
    }

    fn drain_frames(&mut self, out: &mut Vec<Result<serde_json::Value, FrameError>>) {
        loop {
            let leading = self.buffer.len() - self.buffer.trim_start().len();
            self.buffer.drain(..leading);
            if self.buffer.is_empty() {
                return;
            }

            let (next, consumed) = {
                let mut stream =
                    serde_json::Deserializer::from_str(&self.buffer).into_iter::<serde_json::Value>();
                let next = stream.next();
                (next, stream.byte_offset())
            };

            match next {
                Some(Ok(frame)) => {
                    self.buffer.drain(..consumed);
                    out.push(Ok(frame));
                }
                Some(Err(error)) if error.is_eof() => {
                    if self.buffer.len() > self.max_frame_bytes {
                        let len = self.buffer.len();
                        self.clear();
                        warn!(
                            target: FRAME_TARGET,
                            len,
                            limit = self.max_frame_bytes,
                            "discarding oversized incomplete frame"
                        );
                        out.push(Err(FrameError::Oversized {
                            len,
                            limit: self.max_frame_bytes,
                        }));
                    }
                    return;
                }
                Some(Err(source)) => {
                    let discarded = self.buffer.len();
                    self.clear();
                    warn!(
                        target: FRAME_TARGET,
                        discarded,
                        error = %source,
                        "discarding malformed frame buffer"
                    );
                    out.push(Err(FrameError::Malformed { discarded, source }));
                    return;
                }
                None => return,
            }
        }
    }
}
