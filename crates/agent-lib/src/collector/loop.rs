//! Snapshot collection loop
//!
//! Periodically runs the orchestrator and appends each snapshot to the
//! backlog shared with the delivery loop.

use super::orchestrator::{Collection, Orchestrator};
use crate::error::AgentError;
use crate::health::HealthRegistry;
use crate::models::Snapshot;
use crate::observability::{AgentMetrics, StructuredLogger};
use crate::sync::SharedBacklog;
use anyhow::Result;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Configuration for the collection loop
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Collection interval (default: 5 seconds)
    pub interval: Duration,
    /// Bound on every source call within one tick (default: 5 seconds)
    pub source_timeout: Duration,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            source_timeout: Duration::from_secs(5),
        }
    }
}

/// Collects one snapshot per tick into the backlog
pub struct CollectionLoop {
    orchestrator: Orchestrator,
    backlog: SharedBacklog<Snapshot>,
    config: CollectionConfig,
    metrics: AgentMetrics,
    logger: StructuredLogger,
    health: Option<HealthRegistry>,
}

impl CollectionLoop {
    pub fn new(
        orchestrator: Orchestrator,
        backlog: SharedBacklog<Snapshot>,
        config: CollectionConfig,
    ) -> Self {
        Self {
            orchestrator,
            backlog,
            config,
            metrics: AgentMetrics::new(),
            logger: StructuredLogger::new("local"),
            health: None,
        }
    }

    /// Run until `cancel` fires
    ///
    /// A tick still collecting when cancellation arrives is abandoned and
    /// produces no snapshot.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            source_timeout_ms = self.config.source_timeout.as_millis() as u64,
            "Starting collection loop"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let started = Instant::now();
            let collection = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Discarding in-flight collection");
                    break;
                }
                collection = self.orchestrator.collect(started + self.config.source_timeout) => collection,
            };
            self.record(collection, started.elapsed()).await;
        }

        info!(backlog_len = self.backlog.len(), "Collection loop stopped");
    }

    /// Collect and record a single snapshot, returning the collection
    pub async fn collect_once(&self) -> Collection {
        let started = Instant::now();
        let collection = self
            .orchestrator
            .collect(started + self.config.source_timeout)
            .await;
        self.record(collection.clone(), started.elapsed()).await;
        collection
    }

    async fn record(&self, collection: Collection, elapsed: Duration) {
        let Collection { snapshot, errors } = collection;
        let sandboxes = snapshot.units.len();
        let containers = snapshot.container_count();

        for error in &errors {
            self.metrics.inc_collection_errors(error.kind());
            self.logger.log_collection_error(error);
        }

        // Appended even when some sources failed
        if let Some(evicted) = self.backlog.add(snapshot) {
            self.metrics.inc_snapshots_dropped("overwritten");
            self.logger
                .log_snapshot_dropped(evicted.timestamp, "overwritten");
        }

        let backlog_len = self.backlog.len();
        self.metrics.observe_collection_latency(elapsed.as_secs_f64());
        self.metrics
            .set_observed(sandboxes as i64, containers as i64);
        self.metrics
            .set_backlog(backlog_len as i64, self.backlog.capacity() as i64);
        self.logger.log_collection(
            sandboxes,
            containers,
            errors.len(),
            elapsed.as_millis(),
            backlog_len,
        );

        if let Some(health) = &self.health {
            self.report_health(health, &errors, backlog_len).await;
        }
    }

    async fn report_health(&self, health: &HealthRegistry, errors: &[AgentError], backlog_len: usize) {
        health.record_collection(errors).await;
        health
            .record_backlog(backlog_len, self.backlog.capacity())
            .await;
    }
}

/// Builder for the collection loop
pub struct CollectionLoopBuilder {
    orchestrator: Option<Orchestrator>,
    backlog: Option<SharedBacklog<Snapshot>>,
    config: CollectionConfig,
    logger: Option<StructuredLogger>,
    health: Option<HealthRegistry>,
}

impl CollectionLoopBuilder {
    pub fn new() -> Self {
        Self {
            orchestrator: None,
            backlog: None,
            config: CollectionConfig::default(),
            logger: None,
            health: None,
        }
    }

    pub fn orchestrator(mut self, orchestrator: Orchestrator) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    pub fn backlog(mut self, backlog: SharedBacklog<Snapshot>) -> Self {
        self.backlog = Some(backlog);
        self
    }

    /// Set the collection interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Set the per-source deadline
    pub fn source_timeout(mut self, timeout: Duration) -> Self {
        self.config.source_timeout = timeout;
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn build(self) -> Result<CollectionLoop> {
        let orchestrator = self
            .orchestrator
            .ok_or_else(|| anyhow::anyhow!("Orchestrator is required"))?;
        let backlog = self
            .backlog
            .ok_or_else(|| anyhow::anyhow!("Backlog is required"))?;

        let mut collection_loop = CollectionLoop::new(orchestrator, backlog, self.config);
        if let Some(logger) = self.logger {
            collection_loop.logger = logger;
        }
        collection_loop.health = self.health;
        Ok(collection_loop)
    }
}

impl Default for CollectionLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
