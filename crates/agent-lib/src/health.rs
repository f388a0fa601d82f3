//! Component health behind the liveness and readiness probes
//!
//! Each component is fed from the loop that owns it: the collection loop
//! reports source failures and backlog fill, the delivery loop reports the
//! relay link state.

use crate::error::{AgentError, SourceKind};
use crate::sync::LinkState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Working with reduced data or buffering locally
    Degraded,
    Unhealthy,
}

/// Parts of the agent tracked by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// Snapshot collection as a whole
    Collector,
    /// The four container runtime queries
    Runtime,
    /// Stream to the relay
    Relay,
    Backlog,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Collector,
        Component::Runtime,
        Component::Relay,
        Component::Backlog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Collector => "collector",
            Component::Runtime => "runtime",
            Component::Relay => "relay",
            Component::Backlog => "backlog",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::new(ComponentStatus::Healthy, None)
    }

    /// Collector health after one tick
    pub fn for_collection(errors: &[AgentError]) -> Self {
        match errors.len() {
            0 => Self::healthy(),
            n => Self::new(
                ComponentStatus::Degraded,
                Some(format!("{n} errors in last collection")),
            ),
        }
    }

    /// Runtime health from the runtime sources that failed this tick
    ///
    /// Unhealthy only when every runtime query failed.
    pub fn for_runtime(failed: &[SourceKind]) -> Self {
        let failed: Vec<SourceKind> = SourceKind::RUNTIME
            .into_iter()
            .filter(|kind| failed.contains(kind))
            .collect();
        if failed.is_empty() {
            return Self::healthy();
        }

        let names: Vec<&str> = failed.iter().map(SourceKind::as_str).collect();
        let message = Some(format!("runtime sources failed: {}", names.join(", ")));
        if failed.len() == SourceKind::RUNTIME.len() {
            Self::new(ComponentStatus::Unhealthy, message)
        } else {
            Self::new(ComponentStatus::Degraded, message)
        }
    }

    /// Relay health from the link state; `None` once the link is terminated
    pub fn for_link(state: LinkState, buffered: usize) -> Option<Self> {
        match state {
            LinkState::Connected => Some(Self::healthy()),
            LinkState::Terminated => None,
            _ => Some(Self::new(
                ComponentStatus::Degraded,
                Some(format!("relay link {state}, {buffered} snapshots buffered")),
            )),
        }
    }

    /// Backlog health; degraded once new snapshots start evicting old ones
    pub fn for_backlog(len: usize, capacity: usize) -> Self {
        if len >= capacity {
            Self::new(
                ComponentStatus::Degraded,
                Some(format!("backlog full at {len} snapshots")),
            )
        } else {
            Self::healthy()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across components
    pub fn compute_status<'a>(
        components: impl IntoIterator<Item = &'a ComponentHealth>,
    ) -> ComponentStatus {
        components
            .into_iter()
            .map(|health| health.status)
            .fold(ComponentStatus::Healthy, |worst, status| {
                match (worst, status) {
                    (ComponentStatus::Unhealthy, _) | (_, ComponentStatus::Unhealthy) => {
                        ComponentStatus::Unhealthy
                    }
                    (ComponentStatus::Degraded, _) | (_, ComponentStatus::Degraded) => {
                        ComponentStatus::Degraded
                    }
                    _ => ComponentStatus::Healthy,
                }
            })
    }

    pub fn component(&self, component: Component) -> Option<&ComponentHealth> {
        self.components.get(component.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Shared health state, cloned into both loops and the API
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<Component, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every component as healthy
    pub async fn register_all(&self) {
        let mut components = self.components.write().await;
        for component in Component::ALL {
            components.insert(component, ComponentHealth::healthy());
        }
    }

    async fn update(&self, component: Component, health: ComponentHealth) {
        self.components.write().await.insert(component, health);
    }

    /// Record the outcome of one collection tick
    pub async fn record_collection(&self, errors: &[AgentError]) {
        let failed: Vec<SourceKind> = errors
            .iter()
            .filter_map(|e| match e {
                AgentError::Source { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();

        let mut components = self.components.write().await;
        components.insert(Component::Collector, ComponentHealth::for_collection(errors));
        components.insert(Component::Runtime, ComponentHealth::for_runtime(&failed));
    }

    pub async fn record_runtime(&self, failed: &[SourceKind]) {
        self.update(Component::Runtime, ComponentHealth::for_runtime(failed))
            .await;
    }

    pub async fn record_link(&self, state: LinkState, buffered: usize) {
        if let Some(health) = ComponentHealth::for_link(state, buffered) {
            self.update(Component::Relay, health).await;
        }
    }

    pub async fn record_backlog(&self, len: usize, capacity: usize) {
        self.update(Component::Backlog, ComponentHealth::for_backlog(len, capacity))
            .await;
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await;
        HealthResponse {
            status: HealthResponse::compute_status(components.values()),
            components: components
                .iter()
                .map(|(component, health)| (component.as_str().to_string(), health.clone()))
                .collect(),
        }
    }

    /// Ready once wired, as long as no component is unhealthy
    pub async fn readiness(&self) -> ReadinessResponse {
        let reason = if !*self.ready.read().await {
            Some("Agent not yet initialized")
        } else if self.health().await.status == ComponentStatus::Unhealthy {
            Some("Critical component unhealthy")
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason: reason.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_registry_is_healthy() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_register_all_components() {
        let registry = HealthRegistry::new();
        registry.register_all().await;

        let health = registry.health().await;
        assert_eq!(health.components.len(), Component::ALL.len());
        for component in Component::ALL {
            assert_eq!(
                health.component(component).unwrap().status,
                ComponentStatus::Healthy
            );
        }
    }

    #[test]
    fn test_runtime_health_by_failed_sources() {
        assert_eq!(
            ComponentHealth::for_runtime(&[]).status,
            ComponentStatus::Healthy
        );
        // Host failures are not a runtime concern
        assert_eq!(
            ComponentHealth::for_runtime(&[SourceKind::Host]).status,
            ComponentStatus::Healthy
        );

        let partial = ComponentHealth::for_runtime(&[SourceKind::ContainerStats, SourceKind::Sandboxes]);
        assert_eq!(partial.status, ComponentStatus::Degraded);
        assert_eq!(
            partial.message.as_deref(),
            Some("runtime sources failed: sandboxes, container_stats")
        );

        let all = ComponentHealth::for_runtime(&SourceKind::RUNTIME);
        assert_eq!(all.status, ComponentStatus::Unhealthy);
    }

    #[test]
    fn test_relay_health_by_link_state() {
        assert_eq!(
            ComponentHealth::for_link(LinkState::Connected, 0).unwrap().status,
            ComponentStatus::Healthy
        );
        let backoff = ComponentHealth::for_link(LinkState::Backoff, 12).unwrap();
        assert_eq!(backoff.status, ComponentStatus::Degraded);
        assert_eq!(
            backoff.message.as_deref(),
            Some("relay link backoff, 12 snapshots buffered")
        );
        assert!(ComponentHealth::for_link(LinkState::Terminated, 3).is_none());
    }

    #[test]
    fn test_backlog_health_degrades_when_full() {
        assert_eq!(
            ComponentHealth::for_backlog(3, 4).status,
            ComponentStatus::Healthy
        );
        assert_eq!(
            ComponentHealth::for_backlog(4, 4).status,
            ComponentStatus::Degraded
        );
    }

    #[tokio::test]
    async fn test_record_collection_sets_collector_and_runtime() {
        let registry = HealthRegistry::new();
        registry.register_all().await;

        registry
            .record_collection(&[
                AgentError::source_failure(SourceKind::Host, "no /proc"),
                AgentError::source_failure(SourceKind::Containers, "unavailable"),
            ])
            .await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        let collector = health.component(Component::Collector).unwrap();
        assert_eq!(collector.message.as_deref(), Some("2 errors in last collection"));
        assert_eq!(
            health.component(Component::Runtime).unwrap().message.as_deref(),
            Some("runtime sources failed: containers")
        );
    }

    #[tokio::test]
    async fn test_terminated_link_keeps_last_relay_health() {
        let registry = HealthRegistry::new();
        registry.register_all().await;

        registry.record_link(LinkState::Backoff, 2).await;
        registry.record_link(LinkState::Terminated, 2).await;

        let health = registry.health().await;
        assert_eq!(
            health.component(Component::Relay).unwrap().status,
            ComponentStatus::Degraded
        );
    }

    #[tokio::test]
    async fn test_readiness_follows_wiring_and_health() {
        let registry = HealthRegistry::new();
        registry.register_all().await;

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Agent not yet initialized"));

        registry.set_ready(true).await;
        assert!(registry.readiness().await.ready);

        registry.record_runtime(&SourceKind::RUNTIME).await;
        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Critical component unhealthy"));
    }
}
