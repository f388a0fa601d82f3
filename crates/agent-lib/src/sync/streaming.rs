//! Delivery of backlogged snapshots to the relay
//!
//! The loop owns one outbound stream and moves it through explicit link
//! states:
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//!                  ^      |        |
//!                  |      v        | send failure
//!                  Backoff         v
//!                              Disconnected
//! ```
//!
//! Cancellation moves any state to `Terminated`.

use super::buffer::SharedBacklog;
use super::client::{OutboundStream, StreamOpener};
use crate::error::AgentError;
use crate::health::HealthRegistry;
use crate::models::Snapshot;
use crate::observability::{AgentMetrics, StructuredLogger};
use std::fmt;
use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Exponential reconnect delay: initial, doubling, capped
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Option<Duration>,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial: initial.min(max),
            max,
            current: None,
        }
    }

    /// Delay before the next attempt after one more consecutive failure
    pub fn next_delay(&mut self) -> Duration {
        let next = match self.current {
            None => self.initial,
            Some(current) => current.saturating_mul(2).min(self.max),
        };
        self.current = Some(next);
        next
    }

    /// Forget past failures after a successful connect
    pub fn reset(&mut self) {
        self.current = None;
    }
}

/// Link to the relay
pub enum Link {
    Disconnected,
    Connecting,
    Backoff(Duration),
    Connected(Box<dyn OutboundStream>),
    Terminated,
}

/// Payload-free view of [`Link`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Backoff,
    Connected,
    Terminated,
}

impl Link {
    pub fn state(&self) -> LinkState {
        match self {
            Link::Disconnected => LinkState::Disconnected,
            Link::Connecting => LinkState::Connecting,
            Link::Backoff(_) => LinkState::Backoff,
            Link::Connected(_) => LinkState::Connected,
            Link::Terminated => LinkState::Terminated,
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Backoff => "backoff",
            LinkState::Connected => "connected",
            LinkState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Configuration for the delivery loop
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Tick interval (default: 5 seconds)
    pub interval: Duration,
    /// First reconnect delay (default: 1 second)
    pub initial_backoff: Duration,
    /// Reconnect delay cap (default: 30 seconds)
    pub max_backoff: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Streams backlogged snapshots to the relay on a fixed cadence
pub struct DeliveryLoop<O: StreamOpener> {
    opener: O,
    backlog: SharedBacklog<Snapshot>,
    link: Link,
    backoff: Backoff,
    config: DeliveryConfig,
    metrics: AgentMetrics,
    logger: StructuredLogger,
    health: Option<HealthRegistry>,
}

impl<O: StreamOpener> DeliveryLoop<O> {
    pub fn new(opener: O, backlog: SharedBacklog<Snapshot>, config: DeliveryConfig) -> Self {
        Self {
            opener,
            backlog,
            link: Link::Disconnected,
            backoff: Backoff::new(config.initial_backoff, config.max_backoff),
            config,
            metrics: AgentMetrics::new(),
            logger: StructuredLogger::new("local"),
            health: None,
        }
    }

    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn state(&self) -> LinkState {
        self.link.state()
    }

    /// Run until `cancel` fires, then close any open stream
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "Starting delivery loop"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let state = self.tick(None, &cancel).await;
            let buffered = self.observe(state);
            if let Some(health) = &self.health {
                health.record_link(state, buffered).await;
            }
            if state == LinkState::Terminated {
                break;
            }
        }

        self.shutdown().await;
    }

    /// One delivery cycle: connect, drain the backlog, then send `fresh`
    ///
    /// Stops at the first send failure; the failed snapshot goes back to
    /// the front of the backlog and nothing after it is attempted.
    pub async fn tick(&mut self, fresh: Option<Snapshot>, cancel: &CancellationToken) -> LinkState {
        if !self.connect(cancel).await || !self.drain(cancel).await {
            if let Some(snapshot) = fresh {
                self.append(snapshot);
            }
            return self.state();
        }

        if let Some(snapshot) = fresh {
            self.send(snapshot, cancel).await;
        }
        self.state()
    }

    /// Drive the link until it is connected; false when cancelled first
    pub async fn connect(&mut self, cancel: &CancellationToken) -> bool {
        loop {
            match std::mem::replace(&mut self.link, Link::Disconnected) {
                Link::Connected(stream) => {
                    self.link = Link::Connected(stream);
                    return true;
                }
                Link::Terminated => {
                    self.link = Link::Terminated;
                    return false;
                }
                Link::Disconnected => self.transition(Link::Connecting),
                Link::Connecting => {
                    self.link = Link::Connecting;
                    self.metrics.inc_reconnect_attempts();
                    let opened = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        result = self.opener.open() => Some(result),
                    };

                    match opened {
                        None => self.transition(Link::Terminated),
                        Some(Ok(stream)) => {
                            self.backoff.reset();
                            self.transition(Link::Connected(stream));
                        }
                        Some(Err(e)) => {
                            let delay = self.backoff.next_delay();
                            warn!(
                                error = %e,
                                retry_in_ms = delay.as_millis() as u64,
                                "Unable to open relay stream"
                            );
                            self.transition(Link::Backoff(delay));
                        }
                    }
                }
                Link::Backoff(delay) => {
                    self.link = Link::Backoff(delay);
                    let cancelled = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => true,
                        _ = sleep(delay) => false,
                    };
                    if cancelled {
                        self.transition(Link::Terminated);
                    } else {
                        self.transition(Link::Connecting);
                    }
                }
            }
        }
    }

    /// Pop and send until the backlog is empty; false on failure or cancel
    async fn drain(&mut self, cancel: &CancellationToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let Some(snapshot) = self.backlog.pop() else {
                return true;
            };
            if !self.send(snapshot, cancel).await {
                return false;
            }
        }
    }

    /// Send one snapshot on the open stream, requeueing it on failure
    async fn send(&mut self, snapshot: Snapshot, cancel: &CancellationToken) -> bool {
        let Link::Connected(stream) = &mut self.link else {
            self.requeue(snapshot);
            return false;
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = stream.send(&snapshot) => Some(result),
        };

        match outcome {
            Some(Ok(())) => {
                self.metrics.inc_snapshots_sent();
                debug!(
                    snapshot_timestamp = snapshot.timestamp,
                    backlog_len = self.backlog.len(),
                    "Snapshot sent"
                );
                true
            }
            Some(Err(e)) => {
                warn!(error = %e, "Relay send failed, discarding stream");
                self.metrics.inc_send_failures();
                self.transition(Link::Disconnected);
                self.requeue(snapshot);
                false
            }
            None => {
                self.requeue(snapshot);
                false
            }
        }
    }

    fn requeue(&self, snapshot: Snapshot) {
        if let Err(snapshot) = self.backlog.requeue(snapshot) {
            let err = AgentError::BacklogOverflow {
                timestamp: snapshot.timestamp,
            };
            warn!(error = %err, "Dropping unsent snapshot");
            self.metrics.inc_snapshots_dropped("requeue_overflow");
            self.logger
                .log_snapshot_dropped(snapshot.timestamp, "requeue_overflow");
        }
    }

    fn append(&self, snapshot: Snapshot) {
        if let Some(evicted) = self.backlog.add(snapshot) {
            self.metrics.inc_snapshots_dropped("overwritten");
            self.logger
                .log_snapshot_dropped(evicted.timestamp, "overwritten");
        }
    }

    fn transition(&mut self, next: Link) {
        let from = self.link.state();
        let to = next.state();
        self.link = next;

        if from != to {
            self.logger.log_link_transition(from, to);
        }
        self.metrics.set_relay_connected(to == LinkState::Connected);
    }

    fn observe(&self, state: LinkState) -> usize {
        let buffered = self.backlog.len();
        self.metrics
            .set_backlog(buffered as i64, self.backlog.capacity() as i64);
        self.logger
            .log_delivery_status(state == LinkState::Connected, buffered);
        buffered
    }

    /// Close the open stream, if any, and wait for the acknowledgment
    pub async fn shutdown(&mut self) {
        let link = std::mem::replace(&mut self.link, Link::Terminated);
        if let Link::Connected(mut stream) = link {
            match stream.close().await {
                Ok(ack) => info!(ack = %ack, "Relay stream closed"),
                Err(e) => warn!(error = %e, "Relay stream closed without acknowledgment"),
            }
        }
        self.metrics.set_relay_connected(false);
        info!(
            backlog_len = self.backlog.len(),
            "Delivery loop stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut backoff = Backoff::default();
        let delays: Vec<u64> = (0..8).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30, 30]);
    }

    #[test]
    fn test_backoff_reset() {
        let mut backoff = Backoff::default();
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_initial_above_cap() {
        let mut backoff = Backoff::new(Duration::from_secs(60), Duration::from_secs(30));
        assert_eq!(backoff.next_delay(), Duration::from_secs(30));
    }

    #[test]
    fn test_delivery_config_default() {
        let config = DeliveryConfig::default();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.max_backoff, Duration::from_secs(30));
    }

    #[test]
    fn test_link_state_display() {
        assert_eq!(LinkState::Backoff.to_string(), "backoff");
        assert_eq!(Link::Terminated.state(), LinkState::Terminated);
    }
}
