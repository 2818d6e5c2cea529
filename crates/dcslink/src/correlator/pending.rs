//! Table of queries waiting for their response.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::CorrelationError;
use crate::command::Command;
use crate::response::Payload;

/// Identity of a query: command id plus the text of its correlation
/// parameter, empty when the command has none.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QueryKey {
    /// Catalogue id of the command.
    pub command_id: u32,
    /// Wire text of the correlation parameter.
    pub argument: String,
}

impl QueryKey {
    #[must_use]
    pub fn new(command_id: u32, argument: impl Into<String>) -> Self {
        Self {
            command_id,
            argument: argument.into(),
        }
    }

    /// Key a response to `command` will resolve.
    #[must_use]
    pub fn for_command(command: &Command) -> Self {
        Self::new(command.id(), command.correlation_value().unwrap_or_default())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.argument.is_empty() {
            write!(formatter, "command {}", self.command_id)
        } else {
            write!(formatter, "command {} [{}]", self.command_id, self.argument)
        }
    }
}

/// Where a query stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Registered, no response yet.
    Waiting,
    /// An outcome is ready to be taken.
    Resolved,
    /// Not in the table.
    Missing,
}

/// Outcome stored for a resolved query.
pub type QueryOutcome = Result<Payload, CorrelationError>;

#[derive(Debug)]
struct Entry {
    key: QueryKey,
    issued_at: Instant,
    outcome: Option<QueryOutcome>,
}

/// Pending queries in registration order.
#[derive(Debug, Default)]
pub struct PendingQueries {
    entries: Vec<Entry>,
}

impl PendingQueries {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a waiting entry. A key can only be pending once.
    pub fn register(&mut self, key: QueryKey) -> Result<(), CorrelationError> {
        if self.position(&key).is_some() {
            return Err(CorrelationError::AlreadyPending { key });
        }
        self.entries.push(Entry {
            key,
            issued_at: Instant::now(),
            outcome: None,
        });
        Ok(())
    }

    /// Stores `outcome` against the matching waiting entry and returns its
    /// key.
    ///
    /// The match is exact on command id and echoed argument. When the
    /// response echoed nothing, the most recently registered waiting entry
    /// for the command id is used instead.
    pub fn resolve(
        &mut self,
        command_id: u32,
        echoed: Option<&str>,
        outcome: QueryOutcome,
    ) -> Option<QueryKey> {
        let argument = echoed.unwrap_or_default();
        let exact = self.entries.iter().position(|entry| {
            entry.outcome.is_none()
                && entry.key.command_id == command_id
                && entry.key.argument == argument
        });
        let index = match exact {
            Some(index) => index,
            None if echoed.is_none() => self
                .entries
                .iter()
                .rposition(|entry| entry.outcome.is_none() && entry.key.command_id == command_id)?,
            None => return None,
        };
        let entry = self.entries.get_mut(index)?;
        entry.outcome = Some(outcome);
        Some(entry.key.clone())
    }

    /// Resolves every waiting entry with the error `make` builds for it.
    pub fn fail_waiting(&mut self, make: impl Fn(&QueryKey) -> CorrelationError) {
        for entry in self.entries.iter_mut().filter(|entry| entry.outcome.is_none()) {
            entry.outcome = Some(Err(make(&entry.key)));
        }
    }

    /// Resolves one waiting entry with an error.
    pub fn fail(&mut self, key: &QueryKey, error: CorrelationError) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.outcome.is_none() && &entry.key == key)
        {
            Some(entry) => {
                entry.outcome = Some(Err(error));
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        match self.position(key).and_then(|index| self.entries.get(index)) {
            Some(entry) if entry.outcome.is_some() => QueryStatus::Resolved,
            Some(_) => QueryStatus::Waiting,
            None => QueryStatus::Missing,
        }
    }

    /// Removes a resolved entry and returns its outcome. Waiting entries are
    /// left in place.
    pub fn take(&mut self, key: &QueryKey) -> Option<QueryOutcome> {
        let index = self.position(key)?;
        if self.entries.get(index)?.outcome.is_none() {
            return None;
        }
        self.entries.remove(index).outcome
    }

    /// Removes an entry whatever its status.
    pub fn remove(&mut self, key: &QueryKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| &entry.key != key);
        before != self.entries.len()
    }

    /// How long the entry has been registered.
    #[must_use]
    pub fn age(&self, key: &QueryKey) -> Option<Duration> {
        self.position(key)
            .and_then(|index| self.entries.get(index))
            .map(|entry| entry.issued_at.elapsed())
    }

    /// Keys in registration order.
    #[must_use]
    pub fn keys(&self) -> Vec<QueryKey> {
        self.entries.iter().map(|entry| entry.key.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn position(&self, key: &QueryKey) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.key == key)
    }
}
