//! Reconciliation loop: poll, diff, swap, notify.
//!
//! One long-lived task polls the spawner service on a fixed interval and
//! reconciles the local caches against the authoritative snapshot. Within an
//! iteration the order is fixed: stale stream entries are removed first,
//! then the snapshot is swapped in and the closable flag recomputed against
//! the new maps, then the change events fire.
//!
//! Poll failures never mutate the cached snapshot and never kill the loop;
//! the next scheduled tick is the retry.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use argus_core::domain::{LastResponse, ProcessSnapshot};
use argus_core::events::{ChangeBroadcaster, ChangeEvent};
use argus_core::ports::{GatewayError, SpawnerGateway};

use crate::cache::ProcessStateCache;
use crate::streams::StreamRegistry;

/// Periodic reconciliation task over one gateway connection.
pub struct Reconciler {
    gateway: Arc<dyn SpawnerGateway>,
    cache: Arc<ProcessStateCache>,
    streams: Arc<StreamRegistry>,
    events: Arc<ChangeBroadcaster>,
    poll_interval: Duration,
    cancel_token: CancellationToken,
}

impl Reconciler {
    /// Create a reconciler over shared state.
    ///
    /// The reconciler is the sole writer of the cached snapshot and the only
    /// component that removes stream entries.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn SpawnerGateway>,
        cache: Arc<ProcessStateCache>,
        streams: Arc<StreamRegistry>,
        events: Arc<ChangeBroadcaster>,
        poll_interval: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            cache,
            streams,
            events,
            poll_interval,
            cancel_token,
        }
    }

    /// Run the loop until the cancellation token fires.
    ///
    /// The first poll happens immediately (the interval's first tick
    /// completes at once), then every `poll_interval`.
    pub async fn run(self) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!(interval_ms = self.poll_interval.as_millis() as u64, "Starting reconciliation loop");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                _ = self.cancel_token.cancelled() => {
                    debug!("Reconciliation loop cancelled");
                    break;
                }
            }
        }
    }

    /// One reconciliation cycle.
    pub async fn poll_once(&self) {
        match self.fetch_snapshot().await {
            Ok(snapshot) => self.apply(snapshot),
            Err(err) => {
                warn!(error = %err, "Poll failed; keeping last-known-good snapshot");
                self.cache.set_comm_error(true);
                self.cache.record_response(LastResponse::error(err.to_string()));
                self.events.emit(ChangeEvent::LastResponseChanged);
            }
        }
    }

    async fn fetch_snapshot(&self) -> Result<ProcessSnapshot, GatewayError> {
        self.gateway.list_processes().await?.into_snapshot()
    }

    /// Diff the fresh snapshot against the cache and publish the changes.
    fn apply(&self, snapshot: ProcessSnapshot) {
        self.cache.set_comm_error(false);
        // A clean poll clears a previously recorded error outcome.
        self.cache.clear_response_after_clean_poll();

        if self.cache.matches(&snapshot) {
            return;
        }

        // Streams whose owning process disappeared from the snapshot go
        // first, so observers of the streams event already see the batch
        // removed when the processes event lands.
        let stale: Vec<String> = self
            .streams
            .names()
            .into_iter()
            .filter(|name| !snapshot.running.contains_key(name))
            .collect();
        if !stale.is_empty() {
            if let Err(err) = self.streams.remove_many(&stale) {
                // Invariant violation: every registered stream belonged to a
                // process from the previous snapshot.
                error!(error = %err, "Stream registry out of sync with process cache");
            }
        }

        let closable = self.cache.apply_snapshot(snapshot);
        debug!(closable_running = closable, "Applied new process snapshot");

        self.events.emit(ChangeEvent::ProcessesChanged);
        self.events.emit(ChangeEvent::LastResponseChanged);
    }
}
