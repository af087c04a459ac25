//! Command surface: start, stop, manage.
//!
//! Each command issues exactly one RPC, records the outcome in the
//! last-response slot and emits a change event. Commands never wait for the
//! reconciliation loop to observe their effect; confirmation arrives through
//! a later poll. Callers never see a transport error either - failures are
//! recorded the same way as service rejections, and the recorded outcome is
//! returned by value ("check last response").

use std::sync::Arc;

use tracing::info;

use argus_core::domain::LastResponse;
use argus_core::events::{ChangeBroadcaster, ChangeEvent};
use argus_core::ports::{ManageRequest, SpawnerGateway, StartRequest, StopRequest};

use crate::cache::ProcessStateCache;
use crate::streams::StreamRegistry;

/// Fire-and-forget command dispatcher over one gateway connection.
pub struct CommandDispatcher {
    gateway: Arc<dyn SpawnerGateway>,
    cache: Arc<ProcessStateCache>,
    streams: Arc<StreamRegistry>,
    events: Arc<ChangeBroadcaster>,
}

impl CommandDispatcher {
    /// Create a dispatcher over shared state.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn SpawnerGateway>,
        cache: Arc<ProcessStateCache>,
        streams: Arc<StreamRegistry>,
        events: Arc<ChangeBroadcaster>,
    ) -> Self {
        Self {
            gateway,
            cache,
            streams,
            events,
        }
    }

    /// Request the start of a new process.
    ///
    /// If the reply carries a stream identifier, the stream is registered
    /// immediately under `name` rather than waiting for the next poll. Until
    /// that poll confirms the process, the registry may briefly hold an
    /// entry for a process the cache does not know yet; reconciliation
    /// resolves this.
    pub async fn start(&self, name: &str, process_type: &str, args: Vec<String>) -> LastResponse {
        info!(name, process_type, "Sending start request");
        let request = StartRequest::new(name, process_type).with_args(args);
        match self.gateway.start_process(request).await {
            Ok(reply) => {
                let stream_id = reply.stream_id().map(ToOwned::to_owned);
                let outcome = self.record(LastResponse::from_reply(reply.status, reply.error_message));
                if let Some(stream_id) = stream_id {
                    self.streams.register(name, stream_id);
                }
                outcome
            }
            Err(err) => self.record(LastResponse::error(err.to_string())),
        }
    }

    /// Request the termination of exactly one process.
    ///
    /// Any stream registered for it stays in place until reconciliation
    /// observes the process gone, so the stream reference may remain valid
    /// for up to one poll interval.
    pub async fn stop(&self, name: &str) -> LastResponse {
        info!(name, "Sending termination request");
        match self.gateway.stop_processes(StopRequest::single(name)).await {
            Ok(reply) => self.record(LastResponse::from_reply(reply.status, reply.error_message)),
            Err(err) => self.record(LastResponse::error(err.to_string())),
        }
    }

    /// Send an opaque lifecycle-management order for a process.
    pub async fn manage(
        &self,
        name: &str,
        order: &str,
        wait_time: u32,
        args: Vec<String>,
    ) -> LastResponse {
        info!(name, order, wait_time, "Sending manage request");
        let request = ManageRequest::new(name, order, wait_time).with_args(args);
        match self.gateway.manage_process(request).await {
            Ok(reply) => self.record(LastResponse::from_reply(reply.status, reply.error_message)),
            Err(err) => self.record(LastResponse::error(err.to_string())),
        }
    }

    /// Overwrite the last-response slot and notify observers.
    fn record(&self, outcome: LastResponse) -> LastResponse {
        self.cache.record_response(outcome.clone());
        self.events.emit(ChangeEvent::LastResponseChanged);
        outcome
    }
}
