//! Supervision client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use argus_core::events::DEFAULT_EVENT_CAPACITY;

/// Default reconciliation poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Configuration for an [`Argus`](crate::Argus) instance.
///
/// All fields have defaults matching the production service, so
/// `ArgusConfig::default()` is a working configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgusConfig {
    /// Interval between reconciliation polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Capacity of the change-event broadcast channel.
    pub event_capacity: usize,
}

impl Default for ArgusConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ArgusConfig {
    /// Set the reconciliation poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the change-event channel capacity.
    #[must_use]
    pub const fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// The poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_service() {
        let config = ArgusConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn builders_override_fields() {
        let config = ArgusConfig::default()
            .with_poll_interval(Duration::from_millis(50))
            .with_event_capacity(8);
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.event_capacity, 8);
    }

    #[test]
    fn deserializes_with_partial_fields() {
        let config: ArgusConfig = serde_json::from_str(r#"{"poll_interval_ms": 500}"#).unwrap();
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
    }
}
