//! Background polling of telemetry commands.
//!
//! The monitor re-sends a fixed list of commands every interval while the
//! client is connected. Results arrive through the client's response
//! observer and snapshot store like any other response.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::catalog::{SELF_DATA, WORLD_OBJECTS};
use crate::client::Client;
use crate::errors::ClientError;

const MONITOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::monitor");
const MONITOR_THREAD: &str = "dcslink-monitor";
const SLEEP_STEP: Duration = Duration::from_millis(50);

/// Commands polled when none are given.
pub const DEFAULT_POLL_COMMANDS: [u32; 2] = [WORLD_OBJECTS, SELF_DATA];

/// Default time between polling rounds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Handle to the polling thread. Dropping it stops the thread.
pub struct Monitor {
    stop: Arc<AtomicBool>,
    rounds: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Starts polling `commands` every `interval`, beginning immediately.
    pub fn start(
        client: Arc<Client>,
        commands: Vec<u32>,
        interval: Duration,
    ) -> Result<Self, ClientError> {
        let stop = Arc::new(AtomicBool::new(false));
        let rounds = Arc::new(AtomicU64::new(0));
        let flag = Arc::clone(&stop);
        let counter = Arc::clone(&rounds);
        let thread = thread::Builder::new()
            .name(MONITOR_THREAD.to_owned())
            .spawn(move || run(&client, &commands, interval, &flag, &counter))
            .map_err(|source| ClientError::Spawn {
                thread: MONITOR_THREAD,
                source,
            })?;
        Ok(Self {
            stop,
            rounds,
            thread: Some(thread),
        })
    }

    /// Rounds issued so far.
    #[must_use]
    pub fn rounds(&self) -> u64 {
        self.rounds.load(Ordering::SeqCst)
    }

    /// Asks the thread to stop after its current step.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Stops the thread and waits for it.
    pub fn join(mut self) -> Result<(), ClientError> {
        self.stop();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| ClientError::ThreadPanic {
                thread: MONITOR_THREAD,
            }),
            None => Ok(()),
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

fn run(client: &Client, commands: &[u32], interval: Duration, stop: &AtomicBool, rounds: &AtomicU64) {
    while !stop.load(Ordering::SeqCst) {
        let started = Instant::now();
        if client.is_connected() {
            poll_once(client, commands, rounds);
        }
        sleep_until(started + interval, stop);
    }
    debug!(target: MONITOR_TARGET, "monitor stopped");
}

fn poll_once(client: &Client, commands: &[u32], rounds: &AtomicU64) {
    // Earlier polls still queued: skip this round.
    let backlog = client.queued_commands();
    if backlog > commands.len() {
        debug!(target: MONITOR_TARGET, backlog, "skipping round");
        return;
    }
    for &id in commands {
        if let Err(error) = client.send_command(id, &[]) {
            warn!(target: MONITOR_TARGET, id, error = %error, "poll command rejected");
            return;
        }
    }
    rounds.fetch_add(1, Ordering::SeqCst);
}

fn sleep_until(deadline: Instant, stop: &AtomicBool) {
    loop {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        thread::sleep(remaining.min(SLEEP_STEP));
    }
}
