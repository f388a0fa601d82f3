//! Error kinds surfaced by collection and delivery
//!
//! None of these terminate the agent. Collection errors are returned next to
//! the snapshot they concern, delivery errors drive the link state machine.

use std::fmt;
use thiserror::Error;

/// The metric source a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Host,
    Sandboxes,
    SandboxStats,
    Containers,
    ContainerStats,
}

impl SourceKind {
    /// The container runtime queries, in listing order
    pub const RUNTIME: [SourceKind; 4] = [
        SourceKind::Sandboxes,
        SourceKind::SandboxStats,
        SourceKind::Containers,
        SourceKind::ContainerStats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Host => "host",
            SourceKind::Sandboxes => "sandboxes",
            SourceKind::SandboxStats => "sandbox_stats",
            SourceKind::Containers => "containers",
            SourceKind::ContainerStats => "container_stats",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a container could not be joined to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Stats,
    Sandbox,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Stats => f.write_str("stats"),
            Missing::Sandbox => f.write_str("sandbox"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    #[error("{kind} source failed: {message}")]
    Source { kind: SourceKind, message: String },

    #[error("container {container_id} in sandbox {sandbox_id} has no matching {missing}")]
    CorrelationMiss {
        container_id: String,
        sandbox_id: String,
        missing: Missing,
    },

    #[error("failed to open relay stream: {0}")]
    DeliveryOpen(String),

    #[error("failed to send snapshot: {0}")]
    DeliverySend(String),

    #[error("backlog full, dropped snapshot taken at {timestamp}")]
    BacklogOverflow { timestamp: i64 },
}

impl AgentError {
    pub fn source_failure(kind: SourceKind, err: impl fmt::Display) -> Self {
        AgentError::Source {
            kind,
            message: err.to_string(),
        }
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Source { .. } => "source",
            AgentError::CorrelationMiss { .. } => "correlation_miss",
            AgentError::DeliveryOpen(_) => "delivery_open",
            AgentError::DeliverySend(_) => "delivery_send",
            AgentError::BacklogOverflow { .. } => "backlog_overflow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display_names_the_source() {
        let err = AgentError::source_failure(SourceKind::ContainerStats, "deadline exceeded");
        assert_eq!(
            err.to_string(),
            "container_stats source failed: deadline exceeded"
        );
        assert_eq!(err.kind(), "source");
    }

    #[test]
    fn test_runtime_kinds_exclude_host() {
        assert_eq!(SourceKind::RUNTIME.len(), 4);
        assert!(!SourceKind::RUNTIME.contains(&SourceKind::Host));
    }

    #[test]
    fn test_correlation_miss_display() {
        let err = AgentError::CorrelationMiss {
            container_id: "c1".into(),
            sandbox_id: "p1".into(),
            missing: Missing::Stats,
        };
        assert_eq!(
            err.to_string(),
            "container c1 in sandbox p1 has no matching stats"
        );
    }
}
