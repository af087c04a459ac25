//! Stream registry: process name to stream handle.
//!
//! Entries are created by a successful start command that returned a stream
//! identifier, and removed by the reconciliation loop once their owning
//! process disappears from the server snapshot. Consumers rendering a stream
//! list should see one atomic transition per reconciliation cycle, so batch
//! removal emits a single change event, not one per entry.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

use argus_core::events::{ChangeBroadcaster, ChangeEvent};

/// Registry consistency failure.
///
/// Removal of an unregistered name indicates a reconciliation bug (the
/// invariant is that every registered name was present in the last
/// snapshot), so it is reported instead of silently ignored.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamRegistryError {
    /// No stream is registered under the given process name.
    #[error("No stream registered for process: {0}")]
    NotRegistered(String),
}

/// Map from process name to externally-resolvable stream handle.
#[derive(Debug)]
pub struct StreamRegistry {
    entries: RwLock<BTreeMap<String, String>>,
    events: Arc<ChangeBroadcaster>,
}

impl StreamRegistry {
    /// Create an empty registry emitting on the given broadcaster.
    #[must_use]
    pub fn new(events: Arc<ChangeBroadcaster>) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            events,
        }
    }

    /// Add or overwrite the stream handle for a process.
    ///
    /// Emits one `StreamsChanged` event.
    pub fn register(&self, name: impl Into<String>, stream_id: impl Into<String>) {
        let name = name.into();
        let stream_id = stream_id.into();
        debug!(name = %name, stream_id = %stream_id, "Registering stream");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, stream_id);
        self.events.emit(ChangeEvent::StreamsChanged);
    }

    /// Remove the listed entries as one batch.
    ///
    /// Emits exactly one `StreamsChanged` event for the whole batch; an
    /// empty batch emits nothing. If a name is not registered the remaining
    /// names are still removed and the first missing name is reported.
    pub fn remove_many(&self, names: &[String]) -> Result<(), StreamRegistryError> {
        if names.is_empty() {
            return Ok(());
        }

        let mut missing = None;
        {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            for name in names {
                if entries.remove(name).is_none() && missing.is_none() {
                    missing = Some(name.clone());
                }
            }
        }

        debug!(count = names.len(), "Removed stream batch");
        self.events.emit(ChangeEvent::StreamsChanged);

        match missing {
            Some(name) => Err(StreamRegistryError::NotRegistered(name)),
            None => Ok(()),
        }
    }

    /// Copy of the current name-to-stream mapping.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Registered process names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
