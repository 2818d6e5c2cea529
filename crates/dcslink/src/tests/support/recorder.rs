//! Observers that record what the client reported.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::Client;

use super::wait_until;

/// Thread-safe log of rendered observer events.
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub(crate) fn push(&self, event: impl Into<String>) {
        self.lock().push(event.into());
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Waits until at least `count` events were recorded.
    pub(crate) fn wait_for(&self, count: usize, timeout: Duration) -> Vec<String> {
        wait_until(timeout, || self.lock().len() >= count);
        self.events()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.events.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

/// Records connection states, response syntaxes and errors reported by
/// `client`.
pub(crate) fn attach_recorders(client: &Client) -> (Recorder, Recorder, Recorder) {
    let connection = Recorder::default();
    let responses = Recorder::default();
    let errors = Recorder::default();

    let sink = connection.clone();
    client.on_connection_changed(move |state| sink.push(state.to_string()));
    let sink = responses.clone();
    client.on_response(move |response| sink.push(response.envelope.api_syntax.clone()));
    let sink = errors.clone();
    client.on_error(move |error| sink.push(error.to_string()));

    (connection, responses, errors)
}
