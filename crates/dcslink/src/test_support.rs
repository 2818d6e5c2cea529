//! Fake export-script server for tests.
//!
//! [`FakeSimulator`] accepts clients one at a time, records every command
//! frame it receives, and answers through a caller-supplied responder. Tests can also
//! push raw bytes or close the socket to exercise error paths.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use dcslink_config::{Config, Endpoint};
use serde_json::{Value, json};

const ACCEPT_WINDOW: Duration = Duration::from_secs(5);
const POLL: Duration = Duration::from_millis(20);

type Responder = Box<dyn Fn(&Value) -> Option<String> + Send + 'static>;

/// A scripted stand-in for the simulator's export socket.
pub struct FakeSimulator {
    port: u16,
    commands: Arc<Mutex<Vec<Value>>>,
    writer: Arc<Mutex<Option<TcpStream>>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FakeSimulator {
    /// Listens on an ephemeral port and answers each command with whatever
    /// `responder` returns. `None` sends nothing.
    pub fn spawn(responder: impl Fn(&Value) -> Option<String> + Send + 'static) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake simulator")?;
        listener
            .set_nonblocking(true)
            .context("fake simulator nonblocking")?;
        let port = listener.local_addr().context("local addr")?.port();

        let commands = Arc::new(Mutex::new(Vec::new()));
        let writer = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));
        let server = Server {
            commands: Arc::clone(&commands),
            writer: Arc::clone(&writer),
            stop: Arc::clone(&stop),
            responder: Box::new(responder),
        };
        let handle = thread::Builder::new()
            .name("fake-simulator".to_owned())
            .spawn(move || server.run(&listener))
            .context("spawn fake simulator")?;

        Ok(Self {
            port,
            commands,
            writer,
            stop,
            handle: Some(handle),
        })
    }

    /// A simulator that records commands and never answers.
    pub fn silent() -> Result<Self> {
        Self::spawn(|_| None)
    }

    /// A simulator that answers every command with an empty result.
    pub fn acknowledging() -> Result<Self> {
        Self::spawn(|request| Some(reply_with_result(request, "")))
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new("127.0.0.1", self.port)
    }

    /// Client configuration pointing at this simulator with a short poll.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            host: "127.0.0.1".to_owned(),
            port: self.port,
            connect_timeout_ms: 1_000,
            poll_interval_ms: 20,
            ..Config::default()
        }
    }

    /// Commands received so far, in arrival order.
    #[must_use]
    pub fn received(&self) -> Vec<Value> {
        lock(&self.commands).clone()
    }

    /// Waits until at least `count` commands arrived or `timeout` passed,
    /// returning what was received.
    #[must_use]
    pub fn wait_for_commands(&self, count: usize, timeout: Duration) -> Vec<Value> {
        let deadline = Instant::now() + timeout;
        loop {
            let received = self.received();
            if received.len() >= count || Instant::now() >= deadline {
                return received;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Writes raw bytes to the connected client.
    pub fn push(&self, bytes: &[u8]) -> Result<()> {
        let deadline = Instant::now() + ACCEPT_WINDOW;
        loop {
            {
                let mut writer = lock(&self.writer);
                if let Some(stream) = writer.as_mut() {
                    return stream
                        .write_all(bytes)
                        .and_then(|()| stream.flush())
                        .context("push bytes to client");
                }
            }
            if Instant::now() >= deadline {
                return Err(anyhow!("no client connected"));
            }
            thread::sleep(POLL);
        }
    }

    /// Closes the client connection from the simulator side.
    pub fn close(&self) {
        if let Some(stream) = lock(&self.writer).take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

impl Drop for FakeSimulator {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.close();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Builds the response envelope the export script sends for `request`,
/// echoing its id, syntax and parameters.
#[must_use]
pub fn reply_with_result(request: &Value, result: &str) -> String {
    envelope(request, result, None)
}

/// Builds a response envelope reporting a remote error.
#[must_use]
pub fn reply_with_error(request: &Value, message: &str) -> String {
    envelope(request, "", Some(message))
}

fn envelope(request: &Value, result: &str, error: Option<&str>) -> String {
    let mut frame = json!({
        "id": request["id"],
        "returns_data": request["returns_data"],
        "api_syntax": request["api_syntax"],
        "parameter_count": request["parameter_count"],
        "parameter_defs": request["parameter_defs"],
        "error_thrown": error.is_some(),
        "error_message": error.unwrap_or_default(),
        "result": result,
        "result_type": if result.is_empty() { "nil" } else { "string" },
    })
    .to_string();
    frame.push('\n');
    frame
}

struct Server {
    commands: Arc<Mutex<Vec<Value>>>,
    writer: Arc<Mutex<Option<TcpStream>>>,
    stop: Arc<AtomicBool>,
    responder: Responder,
}

impl Server {
    fn run(self, listener: &TcpListener) {
        while let Some(stream) = self.accept(listener) {
            let _ = self.serve(stream);
            lock(&self.writer).take();
        }
    }

    fn accept(&self, listener: &TcpListener) -> Option<TcpStream> {
        let deadline = Instant::now() + ACCEPT_WINDOW;
        while !self.stop.load(Ordering::SeqCst) && Instant::now() < deadline {
            match listener.accept() {
                Ok((stream, _)) => return Some(stream),
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => thread::sleep(POLL),
                Err(_) => return None,
            }
        }
        None
    }

    fn serve(&self, stream: TcpStream) -> Result<()> {
        stream.set_nonblocking(false).context("blocking stream")?;
        stream
            .set_read_timeout(Some(POLL))
            .context("read timeout")?;
        *lock(&self.writer) = Some(stream.try_clone().context("clone stream")?);

        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();
        while !self.stop.load(Ordering::SeqCst) {
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => return Ok(()),
                Ok(_) if line.ends_with(b"\n") => {
                    self.handle_line(&line)?;
                    line.clear();
                }
                Ok(_) => {}
                Err(error)
                    if matches!(
                        error.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) => {}
                Err(error) => return Err(error).context("read command"),
            }
        }
        Ok(())
    }

    fn handle_line(&self, line: &[u8]) -> Result<()> {
        let request: Value = serde_json::from_slice(line).context("command is JSON")?;
        let reply = (self.responder)(&request);
        lock(&self.commands).push(request);
        if let Some(reply) = reply
            && let Some(stream) = lock(&self.writer).as_mut()
        {
            stream
                .write_all(reply.as_bytes())
                .context("write reply")?;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poison| poison.into_inner())
}
