//! Shared helpers for client-level tests.

mod recorder;

use std::thread;
use std::time::{Duration, Instant};

pub(crate) use recorder::{Recorder, attach_recorders};

/// Upper bound for anything the receive thread does in response to a step.
pub(crate) const SETTLE: Duration = Duration::from_secs(2);

/// Polls `condition` until it holds or `timeout` passes.
pub(crate) fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

/// Parses a comma-separated list of command ids.
pub(crate) fn parse_ids(list: &str) -> Vec<u32> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse()
                .unwrap_or_else(|error| panic!("invalid command id '{item}': {error}"))
        })
        .collect()
}

/// Command ids, in arrival order, of frames a fake simulator recorded.
pub(crate) fn command_ids(frames: &[serde_json::Value]) -> Vec<u32> {
    frames
        .iter()
        .map(|frame| {
            frame["id"]
                .as_u64()
                .and_then(|id| u32::try_from(id).ok())
                .unwrap_or_else(|| panic!("frame without a numeric id: {frame}"))
        })
        .collect()
}
