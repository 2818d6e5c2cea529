//! FIFO of outbound commands with at most one awaiting its response.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::{debug, warn};

use super::{CORRELATOR_TARGET, QueryKey};
use crate::command::{Command, CommandError};
use crate::transport::{ConnectionError, FrameSink};

/// The command whose response has not arrived yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    /// Command id.
    pub id: u32,
    /// Call syntax of the command.
    pub syntax: &'static str,
    /// Key the response will resolve.
    pub key: QueryKey,
    /// When the frame was written.
    pub sent_at: Instant,
}

/// Result of trying to put the next command on the wire.
#[derive(Debug)]
pub enum SendOutcome {
    /// A command was written and is now in flight.
    Sent {
        /// Id of the command now in flight.
        id: u32,
    },
    /// Another command is still awaiting its response.
    Busy,
    /// Nothing is queued.
    Idle,
    /// Writing failed. The command was dropped and nothing is in flight.
    Failed {
        /// Id of the dropped command.
        id: u32,
        /// Key of the dropped command.
        key: QueryKey,
        /// Write failure.
        error: ConnectionError,
    },
}

#[derive(Debug)]
struct Queued {
    command: Command,
    frame: Vec<u8>,
}

/// Serialises commands so only one is outstanding at a time.
#[derive(Debug, Default)]
pub struct CommandQueue {
    queued: VecDeque<Queued>,
    in_flight: Option<InFlight>,
}

impl CommandQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queued: VecDeque::new(),
            in_flight: None,
        }
    }

    /// Encodes `command`, appends it, and sends it if the wire is free.
    ///
    /// Encoding failures reject the command before it is queued.
    pub fn enqueue(
        &mut self,
        command: Command,
        sink: &dyn FrameSink,
    ) -> Result<SendOutcome, CommandError> {
        let frame = command.encode_frame()?;
        debug!(
            target: CORRELATOR_TARGET,
            id = command.id(),
            queued = self.queued.len() + 1,
            "command queued"
        );
        self.queued.push_back(Queued { command, frame });
        Ok(self.send_next(sink))
    }

    /// Sends the head of the queue unless a command is already in flight.
    pub fn send_next(&mut self, sink: &dyn FrameSink) -> SendOutcome {
        if self.in_flight.is_some() {
            return SendOutcome::Busy;
        }
        let Some(Queued { command, frame }) = self.queued.pop_front() else {
            return SendOutcome::Idle;
        };
        let key = QueryKey::for_command(&command);
        match sink.send_frame(&frame) {
            Ok(()) => {
                debug!(target: CORRELATOR_TARGET, id = command.id(), key = %key, "command sent");
                self.in_flight = Some(InFlight {
                    id: command.id(),
                    syntax: command.syntax(),
                    key,
                    sent_at: Instant::now(),
                });
                SendOutcome::Sent { id: command.id() }
            }
            Err(error) => {
                warn!(
                    target: CORRELATOR_TARGET,
                    id = command.id(),
                    error = %error,
                    "dropping command after send failure"
                );
                SendOutcome::Failed {
                    id: command.id(),
                    key,
                    error,
                }
            }
        }
    }

    /// Frees the in-flight slot and sends the next command.
    pub fn mark_response_received(&mut self, sink: &dyn FrameSink) -> SendOutcome {
        if let Some(done) = self.in_flight.take() {
            debug!(
                target: CORRELATOR_TARGET,
                id = done.id,
                elapsed = ?done.sent_at.elapsed(),
                "response received"
            );
        }
        self.send_next(sink)
    }

    /// Frees the in-flight slot without sending, returning what was there.
    pub fn abandon_in_flight(&mut self) -> Option<InFlight> {
        self.in_flight.take()
    }

    #[must_use]
    pub const fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }

    #[must_use]
    pub const fn is_awaiting_response(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Commands waiting to be sent, excluding the one in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Ids of the waiting commands in send order.
    #[must_use]
    pub fn queued_ids(&self) -> Vec<u32> {
        self.queued.iter().map(|queued| queued.command.id()).collect()
    }

    /// Drops every queued command and the in-flight marker.
    pub fn clear(&mut self) {
        self.queued.clear();
        self.in_flight = None;
    }
}
