//! Supervision runtime for the Argus process control client.
//!
//! This crate implements the client side of a remote process-spawning
//! service: a periodic reconciliation loop that keeps a last-known-good view
//! of running processes, a registry of the media streams those processes
//! expose, and a fire-and-forget command surface (start/stop/manage) whose
//! effects are confirmed by the next poll rather than by the call itself.
//!
//! The [`Argus`] facade ties the pieces together; everything underneath is
//! also public for adapters that need finer-grained wiring.

#![deny(unsafe_code)]

pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod reconciler;
pub mod streams;
pub mod supervisor;

// Re-export the facade and its direct collaborators
pub use cache::ProcessStateCache;
pub use config::{ArgusConfig, DEFAULT_POLL_INTERVAL_MS};
pub use dispatcher::CommandDispatcher;
pub use reconciler::Reconciler;
pub use streams::{StreamRegistry, StreamRegistryError};
pub use supervisor::{Argus, SupervisorError};

// Re-export the core types callers need to consume the API
pub use argus_core::domain::{LastResponse, ProcessRecord, ProcessSnapshot, ProcessView, TypeInfo};
pub use argus_core::events::{ChangeBroadcaster, ChangeEvent};
pub use argus_core::ports::{GatewayError, SpawnerGateway};
