//! TCP connection to the simulator's export script.
//!
//! [`Connection`] owns the write half and the connection state. The read
//! half is handed to [`receive_loop`] on a dedicated thread by the client.

mod errors;
mod receiver;

use std::io::{self, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use dcslink_config::Endpoint;
use strum::Display;
use tracing::{debug, info, warn};

pub use self::errors::ConnectionError;
pub use self::receiver::{LoopExit, READ_BUFFER_BYTES, receive_loop};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Lifecycle of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    /// No socket is open.
    Disconnected,
    /// A connect attempt is in progress.
    Connecting,
    /// The socket is open and writable.
    Connected,
}

/// Destination for encoded command frames.
pub trait FrameSink {
    /// Writes one complete frame.
    fn send_frame(&self, frame: &[u8]) -> Result<(), ConnectionError>;
}

#[derive(Debug)]
struct Inner {
    state: ConnectionState,
    writer: Option<TcpStream>,
}

/// The write half of the simulator socket plus its state.
#[derive(Debug)]
pub struct Connection {
    inner: Mutex<Inner>,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection {
    /// Creates a disconnected connection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                writer: None,
            }),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Whether frames can be sent.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Opens the socket and returns its read half.
    ///
    /// The read half times out every `poll` so the receiver can notice a
    /// stop request. Each resolved address is tried in turn.
    pub fn connect(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
        poll: Duration,
    ) -> Result<TcpStream, ConnectionError> {
        {
            let mut inner = self.lock();
            if inner.state != ConnectionState::Disconnected {
                return Err(ConnectionError::AlreadyConnected);
            }
            inner.state = ConnectionState::Connecting;
        }

        let opened = open_stream(endpoint, timeout).and_then(|stream| {
            let reader = stream
                .try_clone()
                .and_then(|reader| {
                    reader.set_read_timeout(Some(poll))?;
                    stream.set_nodelay(true)?;
                    Ok(reader)
                })
                .map_err(|source| ConnectionError::Configure { source })?;
            Ok((stream, reader))
        });

        let mut inner = self.lock();
        match opened {
            Ok((writer, reader)) if inner.state == ConnectionState::Connecting => {
                inner.state = ConnectionState::Connected;
                inner.writer = Some(writer);
                info!(target: TRANSPORT_TARGET, endpoint = %endpoint, "connected to simulator");
                Ok(reader)
            }
            Ok((writer, _)) => {
                // Disconnected while the attempt was in flight.
                let _ = writer.shutdown(Shutdown::Both);
                Err(ConnectionError::NotConnected)
            }
            Err(error) => {
                inner.state = ConnectionState::Disconnected;
                warn!(
                    target: TRANSPORT_TARGET,
                    endpoint = %endpoint,
                    error = %error,
                    "connection attempt failed"
                );
                Err(error)
            }
        }
    }

    /// Writes and flushes `bytes`.
    ///
    /// A write failure closes the socket and leaves the connection
    /// disconnected.
    pub fn send(&self, bytes: &[u8]) -> Result<(), ConnectionError> {
        let mut inner = self.lock();
        if inner.state != ConnectionState::Connected {
            return Err(ConnectionError::NotConnected);
        }
        let Some(writer) = inner.writer.as_mut() else {
            return Err(ConnectionError::NotConnected);
        };
        match writer.write_all(bytes).and_then(|()| writer.flush()) {
            Ok(()) => {
                debug!(target: TRANSPORT_TARGET, bytes = bytes.len(), "frame sent");
                Ok(())
            }
            Err(source) => {
                warn!(target: TRANSPORT_TARGET, error = %source, "write failed; closing socket");
                close(&mut inner);
                Err(ConnectionError::Send { source })
            }
        }
    }

    /// Closes the socket, returning the state it was in.
    ///
    /// Closing also unblocks a receiver waiting on the read half.
    pub fn disconnect(&self) -> ConnectionState {
        let mut inner = self.lock();
        let previous = inner.state;
        close(&mut inner);
        if previous != ConnectionState::Disconnected {
            info!(target: TRANSPORT_TARGET, "disconnected from simulator");
        }
        previous
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

impl FrameSink for Connection {
    fn send_frame(&self, frame: &[u8]) -> Result<(), ConnectionError> {
        self.send(frame)
    }
}

fn close(inner: &mut Inner) {
    if let Some(writer) = inner.writer.take()
        && let Err(error) = writer.shutdown(Shutdown::Both)
        && error.kind() != io::ErrorKind::NotConnected
    {
        debug!(target: TRANSPORT_TARGET, error = %error, "socket shutdown failed");
    }
    inner.state = ConnectionState::Disconnected;
}

fn open_stream(endpoint: &Endpoint, timeout: Duration) -> Result<TcpStream, ConnectionError> {
    let addresses = (endpoint.host(), endpoint.port())
        .to_socket_addrs()
        .map_err(|source| ConnectionError::Resolve {
            endpoint: endpoint.to_string(),
            source,
        })?;
    let timeout = timeout.max(Duration::from_millis(1));

    let mut last_error = None;
    for address in addresses {
        match TcpStream::connect_timeout(&address, timeout) {
            Ok(stream) => return Ok(stream),
            Err(error) => {
                debug!(
                    target: TRANSPORT_TARGET,
                    address = %address,
                    error = %error,
                    "address refused connection"
                );
                last_error = Some(error);
            }
        }
    }
    Err(match last_error {
        Some(source) => ConnectionError::Connect {
            endpoint: endpoint.to_string(),
            source,
        },
        None => ConnectionError::ResolveEmpty {
            endpoint: endpoint.to_string(),
        },
    })
}
