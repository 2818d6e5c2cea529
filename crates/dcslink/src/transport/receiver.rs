//! Blocking read loop for the simulator socket.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use super::TRANSPORT_TARGET;

/// Size of each read from the socket.
pub const READ_BUFFER_BYTES: usize = 4096;

/// Why [`receive_loop`] returned.
#[derive(Debug)]
pub enum LoopExit {
    /// The stop flag was raised.
    Stopped,
    /// The peer closed its end of the stream.
    PeerClosed,
    /// Reading failed for a reason other than a poll timeout.
    Failed(io::Error),
}

/// Reads until stopped, closed, or failed, passing each chunk to `on_bytes`.
///
/// The reader should have a read timeout so the stop flag is seen within
/// one poll interval. Chunks read after the flag is raised are discarded.
pub fn receive_loop<R, F>(mut reader: R, stop: &AtomicBool, mut on_bytes: F) -> LoopExit
where
    R: Read,
    F: FnMut(&[u8]),
{
    let mut buffer = [0_u8; READ_BUFFER_BYTES];
    loop {
        if stop.load(Ordering::SeqCst) {
            return LoopExit::Stopped;
        }
        let outcome = reader.read(&mut buffer);
        if stop.load(Ordering::SeqCst) {
            return LoopExit::Stopped;
        }
        match outcome {
            Ok(0) => return LoopExit::PeerClosed,
            Ok(read) => {
                debug!(target: TRANSPORT_TARGET, bytes = read, "chunk received");
                on_bytes(&buffer[..read]);
            }
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) => {}
            Err(error) => return LoopExit::Failed(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use super::*;

    /// Replays scripted read results.
    struct Scripted(VecDeque<io::Result<Vec<u8>>>);

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(error)) => Err(error),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn delivers_chunks_until_the_peer_closes() {
        let stop = AtomicBool::new(false);
        let mut received = Vec::new();
        let exit = receive_loop(Cursor::new(b"{\"id\":1}\n".to_vec()), &stop, |chunk| {
            received.extend_from_slice(chunk);
        });
        assert!(matches!(exit, LoopExit::PeerClosed));
        assert_eq!(received, b"{\"id\":1}\n");
    }

    #[test]
    fn poll_timeouts_are_retried() {
        let stop = AtomicBool::new(false);
        let reader = Scripted(VecDeque::from([
            Err(io::Error::from(io::ErrorKind::WouldBlock)),
            Err(io::Error::from(io::ErrorKind::TimedOut)),
            Ok(b"ab".to_vec()),
        ]));
        let mut chunks = Vec::new();
        let exit = receive_loop(reader, &stop, |chunk| chunk_push(&mut chunks, chunk));
        assert!(matches!(exit, LoopExit::PeerClosed));
        assert_eq!(chunks, vec![b"ab".to_vec()]);
    }

    #[test]
    fn hard_errors_end_the_loop() {
        let stop = AtomicBool::new(false);
        let reader = Scripted(VecDeque::from([Err(io::Error::from(
            io::ErrorKind::ConnectionReset,
        ))]));
        let exit = receive_loop(reader, &stop, |_| {});
        assert!(matches!(exit, LoopExit::Failed(error) if error.kind() == io::ErrorKind::ConnectionReset));
    }

    #[test]
    fn a_raised_stop_flag_wins() {
        let stop = AtomicBool::new(true);
        let mut called = false;
        let exit = receive_loop(Cursor::new(b"data".to_vec()), &stop, |_| called = true);
        assert!(matches!(exit, LoopExit::Stopped));
        assert!(!called);
    }

    fn chunk_push(chunks: &mut Vec<Vec<u8>>, chunk: &[u8]) {
        chunks.push(chunk.to_vec());
    }
}
