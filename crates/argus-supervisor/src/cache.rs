//! Last-known-good process state cache.
//!
//! The cache holds the most recent authoritative snapshot from the spawner
//! service, the derived closable flag, the single last-response slot and the
//! communication-error flag. The reconciliation loop is the sole writer of
//! the snapshot; the command dispatcher and the poll-failure path share the
//! last-response slot (last write wins).
//!
//! Writers replace whole values under the lock, never mutate them field by
//! field, so a concurrent reader always observes either the previous or the
//! next state and nothing in between. Readers get clones.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use argus_core::domain::{LastResponse, ProcessSnapshot, ProcessView};

/// State behind the lock, replaced wholesale on every update.
#[derive(Debug, Default)]
struct CacheState {
    snapshot: ProcessSnapshot,
    closable_running: bool,
    last_response: Option<LastResponse>,
    comm_error: bool,
}

/// Shared cache of the client's view of the remote service.
#[derive(Debug, Default)]
pub struct ProcessStateCache {
    state: RwLock<CacheState>,
}

impl ProcessStateCache {
    /// Create an empty cache (no snapshot, no recorded response).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the cached process state.
    #[must_use]
    pub fn view(&self) -> ProcessView {
        let state = self.read();
        ProcessView {
            running: state.snapshot.running.clone(),
            available: state.snapshot.available.clone(),
            closable_running: state.closable_running,
        }
    }

    /// Copy of the last recorded command or poll outcome.
    #[must_use]
    pub fn last_response(&self) -> Option<LastResponse> {
        self.read().last_response.clone()
    }

    /// Whether the most recent poll attempt failed to reach the service.
    #[must_use]
    pub fn comm_error(&self) -> bool {
        self.read().comm_error
    }

    /// True if the fresh snapshot is value-equal to the cached one.
    #[must_use]
    pub fn matches(&self, snapshot: &ProcessSnapshot) -> bool {
        self.read().snapshot == *snapshot
    }

    /// Names of processes present in the cached snapshot.
    #[must_use]
    pub fn running_names(&self) -> Vec<String> {
        self.read().snapshot.running.keys().cloned().collect()
    }

    /// Replace the cached snapshot and recompute the closable flag.
    ///
    /// Returns the new closable flag. The swap is atomic with respect to
    /// readers: no reader sees the new running map with the old available
    /// map or a stale closable flag.
    pub fn apply_snapshot(&self, snapshot: ProcessSnapshot) -> bool {
        let closable = snapshot.any_closable();
        let mut state = self.write();
        state.snapshot = snapshot;
        state.closable_running = closable;
        closable
    }

    /// Overwrite the last-response slot.
    pub fn record_response(&self, response: LastResponse) {
        self.write().last_response = Some(response);
    }

    /// Apply the clean-poll rule: a successful poll clears the slot when it
    /// is empty or holds an error, so a transient failure does not outlive
    /// the next good snapshot. A recorded *successful* command outcome is
    /// left in place.
    pub fn clear_response_after_clean_poll(&self) {
        let mut state = self.write();
        if state.last_response.as_ref().is_none_or(LastResponse::is_error) {
            state.last_response = None;
        }
    }

    /// Record whether the latest poll reached the service.
    pub fn set_comm_error(&self, failed: bool) {
        self.write().comm_error = failed;
    }
}
