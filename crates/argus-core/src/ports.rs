//! Gateway port for the remote spawner service.
//!
//! This port defines the interface the supervision runtime consumes the
//! process control service through. The transport behind it (gRPC in
//! production) is an implementation detail of the adapter; request and reply
//! DTOs use the service's camelCase JSON casing so adapters can round-trip
//! them without field mapping.
//!
//! # Design Rules
//!
//! - Express **intent**, not transport detail
//! - Transport failures are [`GatewayError`]; a reply whose status is
//!   `error` is a *service*-level failure and flows through the last
//!   recorded response instead
//! - Must support: mock gateway, remote gRPC gateway

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CommandStatus, ProcessRecord, ProcessSnapshot, TypeInfo};

/// Transport-level failure talking to the spawner service.
///
/// These never reach callers of the supervision API directly; the runtime
/// converts them to an error last-response plus a change event.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Could not reach the service at all.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The call did not complete within its deadline.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The service answered with something this client cannot decode.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The service reported an error status on an operation that must
    /// succeed to be usable (e.g. a poll).
    #[error("Service error: {0}")]
    Service(String),
}

/// Reply to a `list_processes` poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListReply {
    /// Service-level outcome of the poll itself.
    pub status: Option<CommandStatus>,
    /// Error message when `status` is `error`.
    pub error_message: String,
    /// Running processes, keyed by unique name.
    pub running_processes: BTreeMap<String, ProcessRecord>,
    /// Currently spawnable types, keyed by type name.
    pub available_process_types: BTreeMap<String, TypeInfo>,
}

impl ListReply {
    /// Extract the authoritative snapshot, failing on a service-level error.
    ///
    /// A reply without an explicit status is treated as successful; some
    /// service builds omit the field on the happy path.
    pub fn into_snapshot(self) -> Result<ProcessSnapshot, GatewayError> {
        match self.status {
            Some(CommandStatus::Error) => Err(GatewayError::Service(self.error_message)),
            Some(CommandStatus::Success) | None => Ok(ProcessSnapshot::new(
                self.running_processes,
                self.available_process_types,
            )),
        }
    }
}

/// Request to start one process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    /// Unique name the new process will be registered under.
    pub name: String,
    /// Process type to instantiate; must be an advertised type.
    #[serde(rename = "type")]
    pub process_type: String,
    /// Free-form arguments forwarded to the spawned process.
    pub args: Vec<String>,
}

impl StartRequest {
    /// Create a start request with no extra arguments.
    pub fn new(name: impl Into<String>, process_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            process_type: process_type.into(),
            args: Vec::new(),
        }
    }

    /// Attach arguments for the spawned process.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

/// Reply to a start request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartReply {
    /// Service-level outcome.
    pub status: CommandStatus,
    /// Error message when `status` is `error`.
    #[serde(default)]
    pub error_message: String,
    /// Stream handle for the new process, when it produces one.
    #[serde(default)]
    pub stream_id: Option<String>,
}

impl StartReply {
    /// The stream handle, if the reply carries a non-empty one.
    ///
    /// The wire format uses an empty string for "no stream", so both `None`
    /// and `""` mean absent.
    #[must_use]
    pub fn stream_id(&self) -> Option<&str> {
        self.stream_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Request to terminate one or more processes by name.
///
/// The wire request is list-shaped even though the client currently always
/// stops a single process per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRequest {
    /// Names of the processes to terminate.
    pub names: Vec<String>,
}

impl StopRequest {
    /// Request termination of exactly one process.
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
        }
    }
}

/// Generic lifecycle-management request (pause/resume/custom).
///
/// The `order` verb is interpreted entirely by the remote service; this
/// client treats it as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageRequest {
    /// Name of the process to manage.
    pub name: String,
    /// Management verb (e.g. "pause", "resume").
    pub order: String,
    /// Caller-specified wait-time hint in seconds.
    pub wait_time: u32,
    /// Free-form arguments for the order.
    pub args: Vec<String>,
}

impl ManageRequest {
    /// Create a manage request with no extra arguments.
    pub fn new(name: impl Into<String>, order: impl Into<String>, wait_time: u32) -> Self {
        Self {
            name: name.into(),
            order: order.into(),
            wait_time,
            args: Vec::new(),
        }
    }

    /// Attach arguments for the order.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

/// Reply to a stop or manage request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandReply {
    /// Service-level outcome.
    pub status: CommandStatus,
    /// Error message when `status` is `error`.
    #[serde(default)]
    pub error_message: String,
}

/// Client boundary of the remote process control service.
///
/// The supervision runtime issues every RPC through this trait; swapping the
/// implementation (gRPC stub, in-memory fake) never touches the
/// reconciliation or command logic. Implementations are responsible for
/// bounding each call with a deadline ([`GatewayError::Timeout`]) and for
/// serializing concurrent calls if the underlying transport requires it;
/// no retries happen at this layer.
#[async_trait]
pub trait SpawnerGateway: Send + Sync {
    /// Fetch the authoritative snapshot of running processes and spawnable
    /// types.
    async fn list_processes(&self) -> Result<ListReply, GatewayError>;

    /// Ask the service to start a process.
    async fn start_process(&self, request: StartRequest) -> Result<StartReply, GatewayError>;

    /// Ask the service to terminate the named processes.
    async fn stop_processes(&self, request: StopRequest) -> Result<CommandReply, GatewayError>;

    /// Send an opaque lifecycle-management order for one process.
    async fn manage_process(&self, request: ManageRequest) -> Result<CommandReply, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_reply_with_error_status_becomes_service_error() {
        let reply = ListReply {
            status: Some(CommandStatus::Error),
            error_message: "scheduler offline".to_string(),
            ..ListReply::default()
        };
        let err = reply.into_snapshot().unwrap_err();
        assert!(matches!(err, GatewayError::Service(msg) if msg == "scheduler offline"));
    }

    #[test]
    fn list_reply_without_status_is_successful() {
        let reply: ListReply = serde_json::from_str(
            r#"{
                "runningProcesses": {"job1": {"type": "spawner", "state": "RUNNING"}},
                "availableProcessTypes": {"spawner": {}}
            }"#,
        )
        .unwrap();
        let snapshot = reply.into_snapshot().unwrap();
        assert_eq!(snapshot.running.len(), 1);
        assert!(snapshot.available.contains_key("spawner"));
    }

    #[test]
    fn empty_stream_id_counts_as_absent() {
        let with_stream = StartReply {
            status: CommandStatus::Success,
            error_message: String::new(),
            stream_id: Some("stream-7".to_string()),
        };
        assert_eq!(with_stream.stream_id(), Some("stream-7"));

        let empty = StartReply {
            status: CommandStatus::Success,
            error_message: String::new(),
            stream_id: Some(String::new()),
        };
        assert_eq!(empty.stream_id(), None);

        let missing: StartReply = serde_json::from_str(r#"{"status": "success"}"#).unwrap();
        assert_eq!(missing.stream_id(), None);
    }

    #[test]
    fn start_request_serializes_type_field() {
        let request = StartRequest::new("job1", "spawner")
            .with_args(vec!["--fps".to_string(), "30".to_string()]);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"type\":\"spawner\""));
        assert!(json.contains("\"args\":[\"--fps\",\"30\"]"));
    }
}
