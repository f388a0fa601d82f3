//! Observability infrastructure for the telemetry agent
//!
//! Provides:
//! - Prometheus metrics (collection latency and errors, backlog depth, delivery outcomes)
//! - Structured JSON logging with tracing

use crate::error::AgentError;
use crate::sync::LinkState;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AgentMetricsInner> = OnceLock::new();

struct AgentMetricsInner {
    collection_latency_seconds: Histogram,
    collection_errors: IntCounterVec,
    sandboxes_observed: IntGauge,
    containers_observed: IntGauge,
    backlog_items: IntGauge,
    backlog_capacity: IntGauge,
    snapshots_sent: IntCounter,
    send_failures: IntCounter,
    reconnect_attempts: IntCounter,
    snapshots_dropped: IntCounterVec,
    relay_connected: IntGauge,
}

impl AgentMetricsInner {
    fn new() -> Self {
        Self {
            collection_latency_seconds: register_histogram!(
                "telemetry_agent_collection_latency_seconds",
                "Time spent collecting one snapshot from all sources",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register collection_latency_seconds"),

            collection_errors: register_int_counter_vec!(
                "telemetry_agent_collection_errors_total",
                "Non-fatal collection errors by kind",
                &["kind"]
            )
            .expect("Failed to register collection_errors"),

            sandboxes_observed: register_int_gauge!(
                "telemetry_agent_sandboxes_observed",
                "Sandboxes in the most recent snapshot"
            )
            .expect("Failed to register sandboxes_observed"),

            containers_observed: register_int_gauge!(
                "telemetry_agent_containers_observed",
                "Containers in the most recent snapshot"
            )
            .expect("Failed to register containers_observed"),

            backlog_items: register_int_gauge!(
                "telemetry_agent_backlog_items",
                "Snapshots waiting in the backlog"
            )
            .expect("Failed to register backlog_items"),

            backlog_capacity: register_int_gauge!(
                "telemetry_agent_backlog_capacity",
                "Maximum number of snapshots the backlog holds"
            )
            .expect("Failed to register backlog_capacity"),

            snapshots_sent: register_int_counter!(
                "telemetry_agent_snapshots_sent_total",
                "Snapshots written to the relay stream"
            )
            .expect("Failed to register snapshots_sent"),

            send_failures: register_int_counter!(
                "telemetry_agent_send_failures_total",
                "Failed sends on an established relay stream"
            )
            .expect("Failed to register send_failures"),

            reconnect_attempts: register_int_counter!(
                "telemetry_agent_reconnect_attempts_total",
                "Attempts to open a relay stream"
            )
            .expect("Failed to register reconnect_attempts"),

            snapshots_dropped: register_int_counter_vec!(
                "telemetry_agent_snapshots_dropped_total",
                "Snapshots discarded without delivery by reason",
                &["reason"]
            )
            .expect("Failed to register snapshots_dropped"),

            relay_connected: register_int_gauge!(
                "telemetry_agent_relay_connected",
                "1 while a relay stream is open"
            )
            .expect("Failed to register relay_connected"),
        }
    }
}

/// Agent metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct AgentMetrics {
    _private: (),
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AgentMetricsInner {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new)
    }

    pub fn observe_collection_latency(&self, duration_secs: f64) {
        self.inner().collection_latency_seconds.observe(duration_secs);
    }

    pub fn inc_collection_errors(&self, kind: &str) {
        self.inner()
            .collection_errors
            .with_label_values(&[kind])
            .inc();
    }

    pub fn set_observed(&self, sandboxes: i64, containers: i64) {
        self.inner().sandboxes_observed.set(sandboxes);
        self.inner().containers_observed.set(containers);
    }

    pub fn set_backlog(&self, items: i64, capacity: i64) {
        self.inner().backlog_items.set(items);
        self.inner().backlog_capacity.set(capacity);
    }

    pub fn inc_snapshots_sent(&self) {
        self.inner().snapshots_sent.inc();
    }

    pub fn inc_send_failures(&self) {
        self.inner().send_failures.inc();
    }

    pub fn inc_reconnect_attempts(&self) {
        self.inner().reconnect_attempts.inc();
    }

    /// Count a snapshot lost to backlog overwrite or requeue overflow
    pub fn inc_snapshots_dropped(&self, reason: &str) {
        self.inner()
            .snapshots_dropped
            .with_label_values(&[reason])
            .inc();
    }

    pub fn set_relay_connected(&self, connected: bool) {
        self.inner().relay_connected.set(i64::from(connected));
    }
}

/// Structured logger for agent events
///
/// Provides consistent JSON-formatted logging for lifecycle,
/// collection and delivery events.
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    /// Log agent startup
    pub fn log_startup(&self, version: &str, relay: &str, runtime_socket: &str) {
        info!(
            event = "agent_started",
            node = %self.node_name,
            agent_version = %version,
            relay = %relay,
            runtime_socket = %runtime_socket,
            "Telemetry agent started"
        );
    }

    /// Log agent shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            node = %self.node_name,
            reason = %reason,
            "Telemetry agent shutting down"
        );
    }

    /// Log the outcome of one collection tick
    pub fn log_collection(
        &self,
        sandboxes: usize,
        containers: usize,
        errors: usize,
        elapsed_ms: u128,
        backlog_len: usize,
    ) {
        debug!(
            event = "snapshot_collected",
            node = %self.node_name,
            sandboxes = sandboxes,
            containers = containers,
            errors = errors,
            elapsed_ms = elapsed_ms as u64,
            backlog_len = backlog_len,
            "Collection cycle complete"
        );
    }

    /// Log one non-fatal collection error
    pub fn log_collection_error(&self, error: &AgentError) {
        match error {
            AgentError::Source { kind, message } => {
                warn!(
                    event = "source_failed",
                    node = %self.node_name,
                    source_kind = %kind,
                    error = %message,
                    "Metric source failed"
                );
            }
            _ => {
                debug!(
                    event = "collection_error",
                    node = %self.node_name,
                    kind = error.kind(),
                    error = %error,
                    "Collection error"
                );
            }
        }
    }

    /// Log a snapshot discarded without being delivered
    pub fn log_snapshot_dropped(&self, timestamp: i64, reason: &str) {
        warn!(
            event = "snapshot_dropped",
            node = %self.node_name,
            snapshot_timestamp = timestamp,
            reason = %reason,
            "Snapshot dropped from backlog"
        );
    }

    /// Log a change of the relay link state
    pub fn log_link_transition(&self, from: LinkState, to: LinkState) {
        match to {
            LinkState::Connected => info!(
                event = "link_transition",
                node = %self.node_name,
                from = %from,
                to = %to,
                "Relay stream connected"
            ),
            _ => debug!(
                event = "link_transition",
                node = %self.node_name,
                from = %from,
                to = %to,
                "Relay link changed state"
            ),
        }
    }

    /// Log delivery status with the relay
    pub fn log_delivery_status(&self, connected: bool, buffered_items: usize) {
        if connected {
            debug!(
                event = "relay_sync",
                node = %self.node_name,
                connected = true,
                buffered_items = buffered_items,
                "Delivered backlog to relay"
            );
        } else {
            warn!(
                event = "relay_sync",
                node = %self.node_name,
                connected = false,
                buffered_items = buffered_items,
                "Relay unavailable, buffering locally"
            );
        }
    }
}
