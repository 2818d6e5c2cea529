//! Observer slots for client events.
//!
//! Each event kind has exactly one slot. Registering replaces the previous
//! observer. Observers run on whichever thread raised the event, never while
//! a client lock is held, and a panicking observer is logged and contained.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::errors::ClientError;
use crate::response::Response;
use crate::transport::ConnectionState;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Shared observer callback.
pub type Observer<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// A single replaceable observer.
pub struct ObserverSlot<T> {
    event: &'static str,
    observer: RwLock<Option<Observer<T>>>,
}

impl<T> ObserverSlot<T> {
    const fn new(event: &'static str) -> Self {
        Self {
            event,
            observer: RwLock::new(None),
        }
    }

    /// Installs `observer`, replacing any previous one.
    pub fn set(&self, observer: impl Fn(&T) + Send + Sync + 'static) {
        *self.observer.write().unwrap_or_else(|poison| poison.into_inner()) = Some(Arc::new(observer));
    }

    /// Removes the observer.
    pub fn clear(&self) {
        *self.observer.write().unwrap_or_else(|poison| poison.into_inner()) = None;
    }

    /// Whether an observer is installed.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.observer
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .is_some()
    }

    /// Calls the observer, if any. Returns whether it ran to completion.
    pub fn fire(&self, value: &T) -> bool {
        let observer = self
            .observer
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone();
        let Some(observer) = observer else {
            return false;
        };
        match panic::catch_unwind(AssertUnwindSafe(|| observer(value))) {
            Ok(()) => true,
            Err(_) => {
                warn!(target: DISPATCH_TARGET, event = self.event, "observer panicked");
                false
            }
        }
    }
}

/// The client's three observer slots.
pub struct Dispatcher {
    /// Connection state changes.
    pub connection: ObserverSlot<ConnectionState>,
    /// Every decoded response, before the queue advances.
    pub response: ObserverSlot<Response>,
    /// Errors raised outside a caller's request.
    pub error: ObserverSlot<ClientError>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connection: ObserverSlot::new("connection"),
            response: ObserverSlot::new("response"),
            error: ObserverSlot::new("error"),
        }
    }
}
