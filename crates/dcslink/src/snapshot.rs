//! Latest world and own-aircraft telemetry.

use std::sync::RwLock;
use std::time::Instant;

use crate::catalog::{SELF_DATA, WORLD_OBJECTS};
use crate::response::{Payload, Response};
use crate::tree::ParsedObject;

/// A value plus when it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// Parsed payload.
    pub value: T,
    /// When the response was decoded.
    pub received_at: Instant,
}

/// Keeps the most recent world-objects and self-data payloads.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    world: RwLock<Option<Snapshot<Vec<ParsedObject>>>>,
    own: RwLock<Option<Snapshot<ParsedObject>>>,
}

impl SnapshotStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            world: RwLock::new(None),
            own: RwLock::new(None),
        }
    }

    /// Records `response` if it carries one of the tracked payloads.
    /// Returns whether anything was stored.
    pub fn record(&self, response: &Response) -> bool {
        if response.remote_error().is_some() {
            return false;
        }
        let Payload::Objects(objects) = &response.payload else {
            return false;
        };
        let received_at = Instant::now();
        match response.command_id() {
            WORLD_OBJECTS => {
                *self.world.write().unwrap_or_else(|poison| poison.into_inner()) = Some(Snapshot {
                    value: objects.clone(),
                    received_at,
                });
                true
            }
            SELF_DATA => match objects.first() {
                Some(object) => {
                    *self.own.write().unwrap_or_else(|poison| poison.into_inner()) = Some(Snapshot {
                        value: object.clone(),
                        received_at,
                    });
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Latest world objects.
    #[must_use]
    pub fn world_objects(&self) -> Option<Snapshot<Vec<ParsedObject>>> {
        self.world
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    /// Latest own-aircraft record.
    #[must_use]
    pub fn self_data(&self) -> Option<Snapshot<ParsedObject>> {
        self.own.read().unwrap_or_else(|poison| poison.into_inner()).clone()
    }

    /// Looks up one object in the latest world snapshot.
    #[must_use]
    pub fn find_object(&self, id: u64) -> Option<ParsedObject> {
        self.world
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .as_ref()?
            .value
            .iter()
            .find(|object| object.id() == Some(id))
            .cloned()
    }

    pub fn clear(&self) {
        *self.world.write().unwrap_or_else(|poison| poison.into_inner()) = None;
        *self.own.write().unwrap_or_else(|poison| poison.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MODEL_TIME;
    use crate::frame::ResponseEnvelope;

    fn response(id: u32, result: &str) -> Response {
        Response::from_envelope(ResponseEnvelope {
            id,
            result: result.to_owned(),
            ..ResponseEnvelope::default()
        })
    }

    #[test]
    fn keeps_the_latest_world_snapshot() {
        let store = SnapshotStore::new();
        assert!(store.record(&response(WORLD_OBJECTS, "1:\n\tName: A\n")));
        assert!(store.record(&response(WORLD_OBJECTS, "2:\n\tName: B\n3:\n\tName: C\n")));

        let world = store.world_objects().expect("world snapshot");
        assert_eq!(world.value.len(), 2);
        assert!(store.find_object(1).is_none());
        assert_eq!(store.find_object(3).and_then(|object| object.id()), Some(3));
    }

    #[test]
    fn keeps_the_own_aircraft_record() {
        let store = SnapshotStore::new();
        assert!(store.record(&response(SELF_DATA, "Name: F-15C\n")));
        let own = store.self_data().expect("self data");
        assert!(own.value.get("Name").is_some());
    }

    #[test]
    fn ignores_other_commands_and_remote_errors() {
        let store = SnapshotStore::new();
        assert!(!store.record(&response(MODEL_TIME, "12.5")));
        let mut failed = response(WORLD_OBJECTS, "1:\n\tName: A\n");
        failed.envelope.error_thrown = true;
        assert!(!store.record(&failed));
        assert!(store.world_objects().is_none());
    }

    #[test]
    fn clear_forgets_both_snapshots() {
        let store = SnapshotStore::new();
        store.record(&response(WORLD_OBJECTS, "1:\n\tName: A\n"));
        store.record(&response(SELF_DATA, "Name: F-15C\n"));
        store.clear();
        assert!(store.world_objects().is_none());
        assert!(store.self_data().is_none());
    }
}
