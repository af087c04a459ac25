//! Core domain types and port definitions for the Argus supervision client.
//!
//! This crate holds everything the supervision runtime needs that is free of
//! tokio-task machinery: the client-side view of the remote spawner service
//! (`domain`), the opaque RPC boundary it is consumed through (`ports`), and
//! the zero-payload change events emitted towards observers (`events`).
//!
//! # Design Rules
//!
//! - No transport crates in any signature - the gateway is an async trait
//! - Domain maps are `BTreeMap` so snapshot diffing is plain value equality
//! - Events carry no payload; observers re-query the accessors

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    CommandStatus, LastResponse, ProcessRecord, ProcessSnapshot, ProcessView, TypeInfo,
};
pub use events::{ChangeBroadcaster, ChangeEvent};
pub use ports::{
    CommandReply, GatewayError, ListReply, ManageRequest, SpawnerGateway, StartReply,
    StartRequest, StopRequest,
};
