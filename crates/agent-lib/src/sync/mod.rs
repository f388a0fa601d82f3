//! Delivery of snapshots to the relay
//!
//! This module provides:
//! - the bounded backlog shared by the collection and delivery loops
//! - the gRPC client streaming snapshots to the relay
//! - the delivery loop with reconnect backoff
//! - conversion of snapshots to wire messages

mod buffer;
mod client;
mod streaming;
pub mod wire;


pub use buffer::{capacity_for, BacklogBuffer, SharedBacklog};
pub use client::{normalize_endpoint, OutboundStream, RelayClient, RelayConfig, StreamOpener};
pub use streaming::{Backoff, DeliveryConfig, DeliveryLoop, Link, LinkState};
