//! Argus supervision facade.
//!
//! `Argus` owns the full client-side state for one spawner-service
//! connection: the process state cache, the stream registry, the change
//! broadcaster and the command dispatcher. One instance per gateway
//! connection, passed by reference to callers - there is no ambient
//! singleton.
//!
//! Key design decisions:
//! - **Explicit lifecycle**: the reconciliation loop is started with
//!   `spawn_reconciler()` and stopped with `shutdown()`; an unkillable
//!   background loop is an operational hazard
//! - **Internal state ownership**: adapters query accessors, they never
//!   hold references into the caches
//! - **Asynchronous confirmation**: command effects are only confirmed by a
//!   later poll, never by the command call itself

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use argus_core::domain::{LastResponse, ProcessView};
use argus_core::events::{ChangeBroadcaster, ChangeEvent};
use argus_core::ports::SpawnerGateway;

use crate::cache::ProcessStateCache;
use crate::config::ArgusConfig;
use crate::dispatcher::CommandDispatcher;
use crate::reconciler::Reconciler;
use crate::streams::StreamRegistry;

/// Handle to the running reconciliation task.
struct ReconcilerHandle {
    /// Cancellation token for graceful shutdown.
    cancel_token: CancellationToken,
    /// Join handle for the loop task.
    join_handle: JoinHandle<()>,
}

/// Error from supervisor lifecycle operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The reconciliation loop is already running.
    #[error("Reconciliation loop is already running")]
    AlreadyRunning,

    /// The reconciliation loop is not running.
    #[error("Reconciliation loop is not running")]
    NotRunning,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Supervision client for one remote spawner-service connection.
///
/// # Example
///
/// ```ignore
/// let argus = Argus::new(gateway, ArgusConfig::default());
/// argus.spawn_reconciler().await?;
/// let mut events = argus.subscribe();
/// argus.start("job1", "spawner", vec![]).await;
/// // ... react to events, query accessors ...
/// argus.shutdown().await?;
/// ```
pub struct Argus {
    gateway: Arc<dyn SpawnerGateway>,
    cache: Arc<ProcessStateCache>,
    streams: Arc<StreamRegistry>,
    events: Arc<ChangeBroadcaster>,
    dispatcher: CommandDispatcher,
    config: ArgusConfig,
    /// Reconciler task state protected by async mutex.
    reconciler: Mutex<Option<ReconcilerHandle>>,
}

impl Argus {
    /// Create a supervision client over a gateway connection.
    ///
    /// The reconciliation loop is not started yet; call
    /// [`spawn_reconciler`](Self::spawn_reconciler).
    #[must_use]
    pub fn new(gateway: Arc<dyn SpawnerGateway>, config: ArgusConfig) -> Self {
        let events = Arc::new(ChangeBroadcaster::with_capacity(config.event_capacity));
        let cache = Arc::new(ProcessStateCache::new());
        let streams = Arc::new(StreamRegistry::new(Arc::clone(&events)));
        let dispatcher = CommandDispatcher::new(
            Arc::clone(&gateway),
            Arc::clone(&cache),
            Arc::clone(&streams),
            Arc::clone(&events),
        );
        Self {
            gateway,
            cache,
            streams,
            events,
            dispatcher,
            config,
            reconciler: Mutex::new(None),
        }
    }

    /// Start the background reconciliation loop.
    pub async fn spawn_reconciler(&self) -> Result<(), SupervisorError> {
        let mut slot = self.reconciler.lock().await;
        if slot.is_some() {
            return Err(SupervisorError::AlreadyRunning);
        }

        let cancel_token = CancellationToken::new();
        let reconciler = Reconciler::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.cache),
            Arc::clone(&self.streams),
            Arc::clone(&self.events),
            self.config.poll_interval(),
            cancel_token.clone(),
        );
        let join_handle = tokio::spawn(reconciler.run());

        info!(
            interval_ms = self.config.poll_interval_ms,
            "Reconciliation loop started"
        );
        *slot = Some(ReconcilerHandle {
            cancel_token,
            join_handle,
        });
        Ok(())
    }

    /// Whether the reconciliation loop is currently running.
    pub async fn is_reconciling(&self) -> bool {
        self.reconciler.lock().await.is_some()
    }

    /// Stop the reconciliation loop and wait for it to exit.
    pub async fn shutdown(&self) -> Result<(), SupervisorError> {
        let handle = {
            let mut slot = self.reconciler.lock().await;
            slot.take().ok_or(SupervisorError::NotRunning)?
        };

        debug!("Stopping reconciliation loop");
        handle.cancel_token.cancel();
        handle
            .join_handle
            .await
            .map_err(|err| SupervisorError::Internal(err.to_string()))?;
        info!("Reconciliation loop stopped");
        Ok(())
    }

    /// Subscribe to change events.
    ///
    /// Events carry no payload; on receipt, re-query the accessors.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    /// Copy of the cached running/available state and the closable flag.
    #[must_use]
    pub fn get_processes(&self) -> ProcessView {
        self.cache.view()
    }

    /// Copy of the most recent command or poll outcome, if any.
    #[must_use]
    pub fn get_last_response(&self) -> Option<LastResponse> {
        self.cache.last_response()
    }

    /// Copy of the current process-name to stream-handle mapping.
    #[must_use]
    pub fn get_streams(&self) -> BTreeMap<String, String> {
        self.streams.snapshot()
    }

    /// Whether the most recent poll attempt failed to reach the service.
    #[must_use]
    pub fn has_communication_error(&self) -> bool {
        self.cache.comm_error()
    }

    /// Request the start of a new process; see
    /// [`CommandDispatcher::start`].
    pub async fn start(&self, name: &str, process_type: &str, args: Vec<String>) -> LastResponse {
        self.dispatcher.start(name, process_type, args).await
    }

    /// Request the termination of one process; see
    /// [`CommandDispatcher::stop`].
    pub async fn stop(&self, name: &str) -> LastResponse {
        self.dispatcher.stop(name).await
    }

    /// Send an opaque lifecycle-management order; see
    /// [`CommandDispatcher::manage`].
    pub async fn manage(
        &self,
        name: &str,
        order: &str,
        wait_time: u32,
        args: Vec<String>,
    ) -> LastResponse {
        self.dispatcher.manage(name, order, wait_time, args).await
    }
}
