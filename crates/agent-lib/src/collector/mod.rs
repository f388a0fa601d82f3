//! Metrics collection from the container runtime and the host
//!
//! This module provides:
//! - source adapters for the CRI runtime service and host statistics
//! - the correlator joining containers to sandboxes and stats
//! - the orchestrator fanning out to all sources for one snapshot
//! - the periodic loop feeding snapshots into the backlog

mod correlate;
mod host;
mod orchestrator;
pub mod psi;
mod r#loop;
mod runtime;


pub use correlate::{correlate, CorrelateOptions, RawInventory};
pub use host::{is_real_filesystem, parse_diskstats, HostCollector};
pub use orchestrator::{Collection, Orchestrator};
pub use r#loop::{CollectionConfig, CollectionLoop, CollectionLoopBuilder};
pub use runtime::{discover_runtime_socket, CriClient, DEFAULT_SOCKET_CANDIDATES};

use crate::models::{NodeMetrics, SandboxState, UnitState};
use crate::proto::runtime::v1 as cri;
use anyhow::Result;
use async_trait::async_trait;

/// Read access to the container runtime
///
/// Each call is one RPC and may fail independently of the others.
#[async_trait]
pub trait RuntimeSource: Send + Sync {
    /// List sandboxes, optionally restricted to one lifecycle state
    async fn list_sandboxes(&self, state: Option<SandboxState>) -> Result<Vec<cri::PodSandbox>>;

    /// List sandbox-level usage statistics
    async fn list_sandbox_stats(&self) -> Result<Vec<cri::PodSandboxStats>>;

    /// List containers, optionally restricted to one lifecycle state
    async fn list_containers(&self, state: Option<UnitState>) -> Result<Vec<cri::Container>>;

    /// List per-container usage statistics
    async fn list_container_stats(&self) -> Result<Vec<cri::ContainerStats>>;
}

/// Host-level statistics
#[async_trait]
pub trait HostSource: Send + Sync {
    /// Gather one host record, including the `top_n` processes by RSS
    async fn collect(&self, top_n: usize) -> Result<NodeMetrics>;
}
