//! Client-side view of the remote spawner service.
//!
//! These are pure value types. The client never fabricates a
//! [`ProcessRecord`]; every record is a copy of what the server reported in
//! the most recent poll, and a whole snapshot replaces the previous one
//! rather than being merged into it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One remote process as reported by the spawner service.
///
/// Keyed by its unique `name` in [`ProcessSnapshot::running`]; the name is
/// stable for the process's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    /// Process class the server instantiated this process from.
    #[serde(rename = "type")]
    pub process_type: String,
    /// Opaque status string supplied by the server (e.g. "RUNNING").
    pub state: String,
}

impl ProcessRecord {
    /// Create a new record from server-reported fields.
    pub fn new(process_type: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            process_type: process_type.into(),
            state: state.into(),
        }
    }
}

/// Descriptive metadata for a process type the server can currently spawn.
///
/// The metadata keys are owned by the service and opaque to this client;
/// only the type *name* (the map key in [`ProcessSnapshot::available`])
/// participates in any client-side decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    /// Free-form descriptive fields as sent by the service.
    #[serde(flatten)]
    pub metadata: BTreeMap<String, String>,
}

impl TypeInfo {
    /// Metadata with no descriptive fields.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            metadata: BTreeMap::new(),
        }
    }
}

/// The authoritative `(running processes, available types)` pair returned by
/// one poll.
///
/// A process absent from `running` no longer exists, regardless of what the
/// previous snapshot said.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSnapshot {
    /// Running processes, keyed by unique process name.
    #[serde(rename = "runningProcesses")]
    pub running: BTreeMap<String, ProcessRecord>,
    /// Types the server can currently instantiate, keyed by type name.
    #[serde(rename = "availableProcessTypes")]
    pub available: BTreeMap<String, TypeInfo>,
}

impl ProcessSnapshot {
    /// Create a snapshot from its two maps.
    #[must_use]
    pub const fn new(
        running: BTreeMap<String, ProcessRecord>,
        available: BTreeMap<String, TypeInfo>,
    ) -> Self {
        Self { running, available }
    }

    /// True iff at least one running process's type is currently advertised
    /// as spawnable, i.e. the process could have been started (and may be
    /// closed) through this client's own command surface.
    #[must_use]
    pub fn any_closable(&self) -> bool {
        self.running
            .values()
            .any(|record| self.available.contains_key(&record.process_type))
    }
}

/// Status of a command or poll outcome as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    /// The service accepted and executed the request.
    Success,
    /// The service rejected the request; see the error message.
    Error,
}

impl CommandStatus {
    /// True for [`CommandStatus::Error`].
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Outcome of the most recently issued command, or of a failed poll.
///
/// Single slot, overwritten by each command or poll failure; never merged or
/// queued. A fresh successful poll clears a previously recorded error state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastResponse {
    /// Whether the operation succeeded.
    pub status: CommandStatus,
    /// Service-supplied error message, empty on success.
    pub error_message: String,
}

impl LastResponse {
    /// A successful outcome with no message.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            status: CommandStatus::Success,
            error_message: String::new(),
        }
    }

    /// An error outcome carrying the service or transport message verbatim.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Error,
            error_message: message.into(),
        }
    }

    /// Build from the raw `(status, error_message)` pair of a service reply.
    pub fn from_reply(status: CommandStatus, error_message: impl Into<String>) -> Self {
        Self {
            status,
            error_message: error_message.into(),
        }
    }

    /// True if this outcome records a failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.status.is_error()
    }
}

/// Copy of the cached process state handed out by the `get_processes`
/// accessor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessView {
    /// Last-known-good running processes.
    pub running: BTreeMap<String, ProcessRecord>,
    /// Last-known-good advertised process types.
    pub available: BTreeMap<String, TypeInfo>,
    /// True iff any running process was startable by this client.
    pub closable_running: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(
        running: &[(&str, &str)],
        available: &[&str],
    ) -> ProcessSnapshot {
        let running = running
            .iter()
            .map(|(name, ty)| ((*name).to_string(), ProcessRecord::new(*ty, "RUNNING")))
            .collect();
        let available = available
            .iter()
            .map(|ty| ((*ty).to_string(), TypeInfo::empty()))
            .collect();
        ProcessSnapshot::new(running, available)
    }

    #[test]
    fn closable_requires_matching_type() {
        let snapshot = snapshot_with(&[("job1", "spawner")], &["spawner"]);
        assert!(snapshot.any_closable());

        let foreign = snapshot_with(&[("job1", "external")], &["spawner"]);
        assert!(!foreign.any_closable());

        let empty = ProcessSnapshot::default();
        assert!(!empty.any_closable());
    }

    #[test]
    fn closable_ignores_available_without_running() {
        let snapshot = snapshot_with(&[], &["spawner", "viewer"]);
        assert!(!snapshot.any_closable());
    }

    #[test]
    fn snapshot_equality_is_value_based() {
        let a = snapshot_with(&[("a", "spawner")], &["spawner"]);
        let b = snapshot_with(&[("a", "spawner")], &["spawner"]);
        assert_eq!(a, b);

        let c = snapshot_with(&[("a", "spawner"), ("b", "viewer")], &["spawner"]);
        assert_ne!(a, c);
    }

    #[test]
    fn record_serializes_with_wire_field_names() {
        let record = ProcessRecord::new("spawner", "RUNNING");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"spawner\""));
        assert!(json.contains("\"state\":\"RUNNING\""));
    }

    #[test]
    fn last_response_round_trip() {
        let response = LastResponse::error("connection refused");
        assert!(response.is_error());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("\"errorMessage\":\"connection refused\""));

        let ok = LastResponse::success();
        assert!(!ok.is_error());
        assert!(ok.error_message.is_empty());
    }
}
