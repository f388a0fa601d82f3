//! Concurrent fan-out over all metric sources for one snapshot

use super::correlate::{correlate, CorrelateOptions, RawInventory};
use super::{HostSource, RuntimeSource};
use crate::error::{AgentError, SourceKind};
use crate::models::{SandboxState, Snapshot};
use std::future::Future;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

/// Result of one collection: a best-effort snapshot plus non-fatal errors
#[derive(Debug, Clone)]
pub struct Collection {
    pub snapshot: Snapshot,
    pub errors: Vec<AgentError>,
}

/// Runs the host query and the four runtime queries concurrently and
/// correlates their results
pub struct Orchestrator {
    runtime: Arc<dyn RuntimeSource>,
    host: Arc<dyn HostSource>,
    top_n: usize,
    sandbox_filter: Option<SandboxState>,
}

impl Orchestrator {
    pub fn new(runtime: Arc<dyn RuntimeSource>, host: Arc<dyn HostSource>) -> Self {
        Self {
            runtime,
            host,
            top_n: 10,
            sandbox_filter: Some(SandboxState::Ready),
        }
    }

    /// Number of processes reported in the top memory list
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Restrict the sandbox listing to one state, or list all with `None`
    pub fn with_sandbox_filter(mut self, filter: Option<SandboxState>) -> Self {
        self.sandbox_filter = filter;
        self
    }

    /// Collect one snapshot; no source call runs past `deadline`
    ///
    /// Every source failure becomes exactly one entry in the error list
    /// and that source's data is treated as empty.
    pub async fn collect(&self, deadline: Instant) -> Collection {
        let timestamp = chrono::Utc::now().timestamp();

        let (host, sandboxes, sandbox_stats, containers, container_stats) = tokio::join!(
            bounded(SourceKind::Host, deadline, self.host.collect(self.top_n)),
            bounded(
                SourceKind::Sandboxes,
                deadline,
                self.runtime.list_sandboxes(self.sandbox_filter)
            ),
            bounded(
                SourceKind::SandboxStats,
                deadline,
                self.runtime.list_sandbox_stats()
            ),
            bounded(
                SourceKind::Containers,
                deadline,
                self.runtime.list_containers(None)
            ),
            bounded(
                SourceKind::ContainerStats,
                deadline,
                self.runtime.list_container_stats()
            ),
        );

        let mut errors = Vec::new();
        let node = settle(host, &mut errors);
        let inventory = RawInventory {
            sandboxes: settle(sandboxes, &mut errors),
            sandbox_stats: settle(sandbox_stats, &mut errors),
            containers: settle(containers, &mut errors),
            container_stats: settle(container_stats, &mut errors),
        };

        let options = CorrelateOptions {
            report_orphans: self.sandbox_filter.is_none(),
        };
        let (units, misses) = correlate(&inventory, options);
        errors.extend(misses);

        debug!(
            sandboxes = units.len(),
            errors = errors.len(),
            "Correlated runtime inventory"
        );

        Collection {
            snapshot: Snapshot {
                timestamp,
                node,
                units,
            },
            errors,
        }
    }
}

async fn bounded<T, F>(kind: SourceKind, deadline: Instant, call: F) -> Result<T, AgentError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match timeout_at(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(AgentError::source_failure(kind, format!("{e:#}"))),
        Err(_) => Err(AgentError::source_failure(kind, "deadline exceeded")),
    }
}

fn settle<T>(result: Result<T, AgentError>, errors: &mut Vec<AgentError>) -> Option<T> {
    result.map_err(|e| errors.push(e)).ok()
}
