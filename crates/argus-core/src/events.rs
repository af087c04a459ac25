//! Change events emitted by the supervision runtime.
//!
//! Events are zero-payload signals: a subscriber that receives one calls
//! back into the accessors (`get_processes`, `get_last_response`,
//! `get_streams`) to obtain the new state. This keeps every subscriber's
//! view consistent with the cache instead of with whatever event it last
//! happened to receive.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag for SSE/GUI forwarding:
//!
//! ```json
//! { "type": "processes_changed" }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Default broadcast channel capacity for change events.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// One category of cached state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// The running-process or available-type maps were replaced.
    ProcessesChanged,
    /// The last command/poll outcome slot was overwritten.
    LastResponseChanged,
    /// Stream registry entries were added or removed.
    StreamsChanged,
}

/// Broadcaster fanning change events out to all subscribers.
///
/// Sending never blocks and never fails: with no subscribers the event is
/// dropped, and a lagging subscriber loses old events rather than slowing
/// the reconciliation loop down.
#[derive(Debug)]
pub struct ChangeBroadcaster {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeBroadcaster {
    /// Create a broadcaster with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a broadcaster with an explicit channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a change event to all subscribers.
    pub fn emit(&self, event: ChangeEvent) {
        // Only log if there are receivers (avoid spam when nobody listens)
        if self.sender.receiver_count() > 0 {
            debug!(?event, "Broadcasting change event");
            let _ = self.sender.send(event);
        }
    }

    /// Subscribe to change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[test]
    fn event_serialization_uses_type_tag() {
        let json = serde_json::to_string(&ChangeEvent::ProcessesChanged).unwrap();
        assert_eq!(json, r#"{"type":"processes_changed"}"#);
        let json = serde_json::to_string(&ChangeEvent::StreamsChanged).unwrap();
        assert_eq!(json, r#"{"type":"streams_changed"}"#);
    }

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let broadcaster = ChangeBroadcaster::with_capacity(8);
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.emit(ChangeEvent::LastResponseChanged);
        let event = assert_ok!(rx.recv().await);
        assert_eq!(event, ChangeEvent::LastResponseChanged);
    }

    #[test]
    fn emit_without_subscribers_is_a_no_op() {
        let broadcaster = ChangeBroadcaster::new();
        broadcaster.emit(ChangeEvent::ProcessesChanged);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
