//! Agent library for node telemetry collection
//!
//! This crate provides the core functionality for:
//! - Collecting host and container runtime metrics into snapshots
//! - Buffering snapshots while the relay is unreachable
//! - Streaming snapshots to the relay over gRPC
//! - Health checks and observability

pub mod collector;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod proto;
pub mod sync;

pub use error::{AgentError, SourceKind};
pub use health::{
    Component, ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse,
    ReadinessResponse,
};
pub use models::*;
pub use observability::{AgentMetrics, StructuredLogger};
