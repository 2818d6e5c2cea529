//! Client facade wiring the connection, decoder, correlator and observers.
//!
//! A [`Client`] owns one connection session at a time. The receive loop runs
//! on a dedicated thread; callers issue commands and queries from any
//! thread. All protocol state sits behind a single mutex that is never held
//! while an observer runs.

use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use dcslink_config::Config;
use tracing::{debug, info, warn};

use crate::catalog::{self, OBJECT_BY_ID};
use crate::command::{Command, ParamValue};
use crate::correlator::{
    CommandQueue, CorrelationError, InFlight, PendingQueries, QueryKey, QueryStatus, SendOutcome,
};
use crate::dispatch::Dispatcher;
use crate::errors::ClientError;
use crate::frame::{FrameDecoder, FrameError, ResponseEnvelope};
use crate::response::{Payload, Response};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::transport::{Connection, ConnectionError, ConnectionState, LoopExit, receive_loop};
use crate::tree::ParsedObject;

const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client");
const RECEIVER_THREAD: &str = "dcslink-receiver";
/// Session id meaning no session is live.
const NO_SESSION: u64 = 0;

/// Everything the receive loop and callers mutate together.
#[derive(Debug)]
struct ProtocolState {
    decoder: FrameDecoder,
    queue: CommandQueue,
    pending: PendingQueries,
}

struct Shared {
    config: Config,
    connection: Connection,
    protocol: Mutex<ProtocolState>,
    resolved: Condvar,
    dispatcher: Dispatcher,
    snapshots: SnapshotStore,
    /// Id of the live session or [`NO_SESSION`]; cleared exactly once by
    /// teardown.
    session: AtomicU64,
    /// Last session id handed out.
    sessions_started: AtomicU64,
}

struct ReceiverHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Connection to the simulator export script.
pub struct Client {
    shared: Arc<Shared>,
    receiver: Mutex<Option<ReceiverHandle>>,
}

impl Client {
    /// Creates a disconnected client.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let decoder = FrameDecoder::new(config.latin1_fallback(), config.max_frame_bytes());
        Self {
            shared: Arc::new(Shared {
                config,
                connection: Connection::new(),
                protocol: Mutex::new(ProtocolState {
                    decoder,
                    queue: CommandQueue::new(),
                    pending: PendingQueries::new(),
                }),
                resolved: Condvar::new(),
                dispatcher: Dispatcher::new(),
                snapshots: SnapshotStore::new(),
                session: AtomicU64::new(NO_SESSION),
                sessions_started: AtomicU64::new(NO_SESSION),
            }),
            receiver: Mutex::new(None),
        }
    }

    /// Configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Opens the socket and starts the receive loop.
    ///
    /// A failed attempt reports `Disconnected` to the connection observer.
    pub fn connect(&self) -> Result<(), ClientError> {
        let config = &self.shared.config;
        let reader = match self.shared.connection.connect(
            &config.endpoint(),
            config.connect_timeout(),
            config.poll_interval(),
        ) {
            Ok(reader) => reader,
            Err(ConnectionError::AlreadyConnected) => {
                return Err(ConnectionError::AlreadyConnected.into());
            }
            Err(error) => {
                self.shared
                    .dispatcher
                    .connection
                    .fire(&ConnectionState::Disconnected);
                return Err(error.into());
            }
        };

        if let Some(previous) = self.lock_receiver().take() {
            join_receiver(previous);
        }
        self.shared.lock_protocol().decoder.clear();
        let session = self.shared.sessions_started.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.session.store(session, Ordering::SeqCst);
        self.shared
            .dispatcher
            .connection
            .fire(&ConnectionState::Connected);

        let stop = Arc::new(AtomicBool::new(false));
        let shared = Arc::clone(&self.shared);
        let flag = Arc::clone(&stop);
        let spawned = thread::Builder::new()
            .name(RECEIVER_THREAD.to_owned())
            .spawn(move || run_receiver(&shared, session, reader, &flag));
        match spawned {
            Ok(thread) => {
                *self.lock_receiver() = Some(ReceiverHandle { stop, thread });
                Ok(())
            }
            Err(source) => {
                self.shared.teardown_session(session);
                Err(ClientError::Spawn {
                    thread: RECEIVER_THREAD,
                    source,
                })
            }
        }
    }

    /// Closes the connection and stops the receive loop.
    ///
    /// Queued commands are dropped and waiting queries fail with a
    /// connection error. Safe to call repeatedly and from observers.
    pub fn disconnect(&self) {
        let handle = self.lock_receiver().take();
        if let Some(handle) = &handle {
            handle.stop.store(true, Ordering::SeqCst);
        }
        self.shared.teardown();
        if let Some(handle) = handle {
            join_receiver(handle);
        }
    }

    /// Whether a session is live.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.connection.is_connected()
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.connection.state()
    }

    /// Queues a catalogue command with parameter overrides.
    ///
    /// Validation failures leave the queue untouched.
    pub fn send_command(&self, id: u32, overrides: &[(&str, ParamValue)]) -> Result<(), ClientError> {
        let command = build_command(id, overrides)?;
        self.enqueue(command)
    }

    /// Queues a prepared command.
    pub fn enqueue(&self, command: Command) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Err(ConnectionError::NotConnected.into());
        }
        let outcome = self
            .shared
            .lock_protocol()
            .queue
            .enqueue(command, &self.shared.connection)?;
        self.shared.settle(outcome).map_err(ClientError::from)
    }

    /// Sends a catalogue command and waits up to `timeout` for its payload.
    ///
    /// The response is matched on the command id and, for commands that
    /// declare one, the value of their correlation parameter.
    pub fn query(
        &self,
        id: u32,
        overrides: &[(&str, ParamValue)],
        timeout: Duration,
    ) -> Result<Payload, ClientError> {
        let command = build_command(id, overrides)?;
        self.query_command(command, timeout)
    }

    /// Sends a prepared command and waits up to `timeout` for its payload.
    pub fn query_command(&self, command: Command, timeout: Duration) -> Result<Payload, ClientError> {
        if !self.is_connected() {
            return Err(ConnectionError::NotConnected.into());
        }
        let key = QueryKey::for_command(&command);
        let outcome = {
            let mut protocol = self.shared.lock_protocol();
            protocol.pending.register(key.clone())?;
            match protocol.queue.enqueue(command, &self.shared.connection) {
                Ok(outcome) => outcome,
                Err(error) => {
                    protocol.pending.remove(&key);
                    return Err(error.into());
                }
            }
        };
        if let Err(error) = self.shared.settle(outcome) {
            self.shared.lock_protocol().pending.remove(&key);
            return Err(error.into());
        }
        self.shared.wait_for(key, timeout)
    }

    /// Fetches one object by id. `Ok(None)` means the simulator knows no
    /// such object.
    pub fn fetch_object(
        &self,
        object_id: u64,
        timeout: Duration,
    ) -> Result<Option<ParsedObject>, ClientError> {
        let payload = self.query(
            OBJECT_BY_ID,
            &[("object_id", ParamValue::from(object_id))],
            timeout,
        )?;
        Ok(payload.into_first_object())
    }

    /// Latest world-objects snapshot.
    #[must_use]
    pub fn world_objects(&self) -> Option<Snapshot<Vec<ParsedObject>>> {
        self.shared.snapshots.world_objects()
    }

    /// Latest own-aircraft snapshot.
    #[must_use]
    pub fn self_data(&self) -> Option<Snapshot<ParsedObject>> {
        self.shared.snapshots.self_data()
    }

    /// Looks up an object in the latest world snapshot.
    #[must_use]
    pub fn find_object(&self, id: u64) -> Option<ParsedObject> {
        self.shared.snapshots.find_object(id)
    }

    /// Keys of queries still waiting or not yet collected.
    #[must_use]
    pub fn pending_queries(&self) -> Vec<QueryKey> {
        self.shared.lock_protocol().pending.keys()
    }

    /// Commands waiting behind the one in flight.
    #[must_use]
    pub fn queued_commands(&self) -> usize {
        self.shared.lock_protocol().queue.len()
    }

    /// The command awaiting its response, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<InFlight> {
        self.shared.lock_protocol().queue.in_flight().cloned()
    }

    /// Observes connection state changes.
    pub fn on_connection_changed(&self, observer: impl Fn(&ConnectionState) + Send + Sync + 'static) {
        self.shared.dispatcher.connection.set(observer);
    }

    /// Observes every decoded response, before the queue advances.
    pub fn on_response(&self, observer: impl Fn(&Response) + Send + Sync + 'static) {
        self.shared.dispatcher.response.set(observer);
    }

    /// Observes protocol errors raised outside a caller's request.
    pub fn on_error(&self, observer: impl Fn(&ClientError) + Send + Sync + 'static) {
        self.shared.dispatcher.error.set(observer);
    }

    /// Removes all three observers.
    pub fn clear_observers(&self) {
        let dispatcher = &self.shared.dispatcher;
        dispatcher.connection.clear();
        dispatcher.response.clear();
        dispatcher.error.clear();
    }

    fn lock_receiver(&self) -> MutexGuard<'_, Option<ReceiverHandle>> {
        self.receiver.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl Shared {
    fn lock_protocol(&self) -> MutexGuard<'_, ProtocolState> {
        self.protocol.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn on_bytes(&self, bytes: &[u8]) {
        let frames = self.lock_protocol().decoder.feed(bytes);
        for frame in frames {
            match frame.and_then(ResponseEnvelope::from_frame) {
                Ok(envelope) => self.on_envelope(envelope),
                Err(error) => self.on_frame_error(error),
            }
        }
    }

    fn on_envelope(&self, envelope: ResponseEnvelope) {
        let response = Response::from_envelope(envelope);
        let id = response.command_id();
        self.snapshots.record(&response);

        let echoed = catalog::find(id)
            .and_then(|definition| definition.correlation)
            .and_then(|name| response.envelope.echoed(name));
        let outcome = match response.remote_error() {
            Some(message) => Err(CorrelationError::Remote {
                id,
                message: message.to_owned(),
            }),
            None => Ok(response.payload.clone()),
        };
        let remote = outcome.as_ref().err().cloned();
        let resolved = self.lock_protocol().pending.resolve(id, echoed, outcome);
        if let Some(key) = resolved {
            debug!(target: CLIENT_TARGET, key = %key, "query resolved");
            self.resolved.notify_all();
        }

        if let Some(error) = remote {
            warn!(target: CLIENT_TARGET, id, error = %error, "simulator reported an error");
            self.dispatcher.error.fire(&ClientError::from(error));
        }
        self.dispatcher.response.fire(&response);

        let outcome = self
            .lock_protocol()
            .queue
            .mark_response_received(&self.connection);
        self.settle_in_background(outcome);
    }

    fn on_frame_error(&self, error: FrameError) {
        warn!(target: CLIENT_TARGET, error = %error, "discarding undecodable input");
        let outcome = {
            let mut protocol = self.lock_protocol();
            if let Some(lost) = protocol.queue.abandon_in_flight() {
                let error = CorrelationError::ResponseLost {
                    key: lost.key.clone(),
                };
                protocol.pending.fail(&lost.key, error);
            }
            protocol.queue.send_next(&self.connection)
        };
        self.resolved.notify_all();
        self.dispatcher.error.fire(&ClientError::from(error));
        self.settle_in_background(outcome);
    }

    /// Tears the session down when a send failed.
    fn settle(&self, outcome: SendOutcome) -> Result<(), ConnectionError> {
        match outcome {
            SendOutcome::Failed { error, .. } => {
                self.teardown();
                Err(error)
            }
            SendOutcome::Sent { .. } | SendOutcome::Busy | SendOutcome::Idle => Ok(()),
        }
    }

    fn settle_in_background(&self, outcome: SendOutcome) {
        if let Err(error) = self.settle(outcome) {
            self.dispatcher.error.fire(&ClientError::from(error));
        }
    }

    fn wait_for(&self, key: QueryKey, timeout: Duration) -> Result<Payload, ClientError> {
        let guard = self.lock_protocol();
        let (mut protocol, _) = self
            .resolved
            .wait_timeout_while(guard, timeout, |protocol| {
                protocol.pending.status(&key) == QueryStatus::Waiting
            })
            .unwrap_or_else(|poison| poison.into_inner());

        match protocol.pending.status(&key) {
            QueryStatus::Resolved => match protocol.pending.take(&key) {
                Some(outcome) => outcome.map_err(ClientError::from),
                None => Err(CorrelationError::ConnectionLost { key }.into()),
            },
            QueryStatus::Waiting => {
                protocol.pending.remove(&key);
                drop(protocol);
                let error = CorrelationError::Timeout { key, timeout };
                warn!(target: CLIENT_TARGET, error = %error, "query timed out");
                self.dispatcher.error.fire(&ClientError::from(error.clone()));
                Err(error.into())
            }
            QueryStatus::Missing => Err(CorrelationError::ConnectionLost { key }.into()),
        }
    }

    /// Ends whichever session is live.
    fn teardown(&self) {
        if self.session.swap(NO_SESSION, Ordering::SeqCst) != NO_SESSION {
            self.close_session();
        }
    }

    /// Ends `session` only if it is still the live one. A receiver outliving
    /// its session must not close a newer one.
    fn teardown_session(&self, session: u64) {
        let current =
            self.session
                .compare_exchange(session, NO_SESSION, Ordering::SeqCst, Ordering::SeqCst);
        if current.is_ok() {
            self.close_session();
        }
    }

    /// Closes the socket, empties protocol state, wakes waiters, then
    /// reports `Disconnected`.
    fn close_session(&self) {
        self.connection.disconnect();
        {
            let mut protocol = self.lock_protocol();
            protocol.decoder.clear();
            protocol.queue.clear();
            protocol
                .pending
                .fail_waiting(|key| CorrelationError::ConnectionLost { key: key.clone() });
        }
        self.resolved.notify_all();
        info!(target: CLIENT_TARGET, "session closed");
        self.dispatcher
            .connection
            .fire(&ConnectionState::Disconnected);
    }
}

fn build_command(id: u32, overrides: &[(&str, ParamValue)]) -> Result<Command, ClientError> {
    let mut command = Command::from_catalog(id)?;
    command.apply_overrides(overrides.iter().map(|(name, value)| (*name, value.clone())))?;
    Ok(command)
}

fn run_receiver(shared: &Shared, session: u64, reader: TcpStream, stop: &AtomicBool) {
    let exit = receive_loop(reader, stop, |bytes| shared.on_bytes(bytes));
    let live = shared.session.load(Ordering::SeqCst) == session;
    match exit {
        LoopExit::Stopped => debug!(target: CLIENT_TARGET, "receiver stopped"),
        LoopExit::PeerClosed if live => {
            info!(target: CLIENT_TARGET, "simulator closed the connection");
        }
        LoopExit::Failed(source) if live => {
            warn!(target: CLIENT_TARGET, error = %source, "receive failed");
            shared
                .dispatcher
                .error
                .fire(&ClientError::from(ConnectionError::Receive { source }));
        }
        LoopExit::PeerClosed | LoopExit::Failed(_) => {}
    }
    shared.teardown_session(session);
}

/// Joins the receiver unless called from the receiver itself.
fn join_receiver(handle: ReceiverHandle) {
    if handle.thread.thread().id() == thread::current().id() {
        return;
    }
    if handle.thread.join().is_err() {
        let error = ClientError::ThreadPanic {
            thread: RECEIVER_THREAD,
        };
        warn!(target: CLIENT_TARGET, error = %error, "receiver join failed");
    }
}
