//! Join raw runtime listings into the sandbox hierarchy
//!
//! Sandboxes keep their list order. Containers are grouped under their
//! owning sandbox in container list order and joined to their stats by
//! container id.

use crate::error::{AgentError, Missing};
use crate::models::*;
use crate::proto::runtime::v1 as cri;
use std::collections::HashMap;

/// Results of the four runtime queries for one tick; `None` marks a failed source
#[derive(Debug, Clone, Default)]
pub struct RawInventory {
    pub sandboxes: Option<Vec<cri::PodSandbox>>,
    pub sandbox_stats: Option<Vec<cri::PodSandboxStats>>,
    pub containers: Option<Vec<cri::Container>>,
    pub container_stats: Option<Vec<cri::ContainerStats>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelateOptions {
    /// Report containers whose sandbox is absent from the listing.
    /// Only meaningful when the sandbox listing was not filtered by state.
    pub report_orphans: bool,
}

/// Build sandbox records and the non-fatal errors found while joining
///
/// A failed source is treated as empty. When container stats failed, the
/// source error already accounts for the loss so no per-container errors
/// are produced.
pub fn correlate(
    inventory: &RawInventory,
    options: CorrelateOptions,
) -> (Vec<SandboxRecord>, Vec<AgentError>) {
    let mut errors = Vec::new();

    let sandboxes = inventory.sandboxes.as_deref().unwrap_or_default();
    let containers = inventory.containers.as_deref().unwrap_or_default();

    let mut by_sandbox: HashMap<&str, Vec<&cri::Container>> = HashMap::new();
    for container in containers {
        by_sandbox
            .entry(container.pod_sandbox_id.as_str())
            .or_default()
            .push(container);
    }

    let container_stats: Option<HashMap<&str, &cri::ContainerStats>> =
        inventory.container_stats.as_ref().map(|stats| {
            stats
                .iter()
                .filter_map(|s| s.attributes.as_ref().map(|a| (a.id.as_str(), s)))
                .collect()
        });

    let sandbox_stats: HashMap<&str, &cri::PodSandboxStats> = inventory
        .sandbox_stats
        .iter()
        .flatten()
        .filter_map(|s| s.attributes.as_ref().map(|a| (a.id.as_str(), s)))
        .collect();

    let mut records = Vec::with_capacity(sandboxes.len());
    for sandbox in sandboxes {
        let mut units = Vec::new();

        if let Some(stats_index) = &container_stats {
            for container in by_sandbox.remove(sandbox.id.as_str()).unwrap_or_default() {
                match stats_index.get(container.id.as_str()) {
                    Some(stats) => units.push(unit_record(container, stats)),
                    None => errors.push(AgentError::CorrelationMiss {
                        container_id: container.id.clone(),
                        sandbox_id: sandbox.id.clone(),
                        missing: Missing::Stats,
                    }),
                }
            }
        }

        let usage = sandbox_stats
            .get(sandbox.id.as_str())
            .and_then(|s| s.linux.as_ref())
            .map(sandbox_usage);

        records.push(sandbox_record(sandbox, usage, units));
    }

    if options.report_orphans && inventory.sandboxes.is_some() && container_stats.is_some() {
        for container in containers {
            if by_sandbox.contains_key(container.pod_sandbox_id.as_str()) {
                errors.push(AgentError::CorrelationMiss {
                    container_id: container.id.clone(),
                    sandbox_id: container.pod_sandbox_id.clone(),
                    missing: Missing::Sandbox,
                });
            }
        }
    }

    (records, errors)
}

pub(crate) fn sandbox_state(state: i32) -> SandboxState {
    if state == cri::PodSandboxState::SandboxReady as i32 {
        SandboxState::Ready
    } else if state == cri::PodSandboxState::SandboxNotready as i32 {
        SandboxState::NotReady
    } else {
        SandboxState::Unknown
    }
}

pub(crate) fn unit_state(state: i32) -> UnitState {
    if state == cri::ContainerState::ContainerCreated as i32 {
        UnitState::Created
    } else if state == cri::ContainerState::ContainerRunning as i32 {
        UnitState::Running
    } else if state == cri::ContainerState::ContainerExited as i32 {
        UnitState::Exited
    } else {
        UnitState::Unknown
    }
}

fn value(v: &Option<cri::UInt64Value>) -> Option<u64> {
    v.as_ref().map(|v| v.value)
}

fn sandbox_record(
    sandbox: &cri::PodSandbox,
    usage: Option<SandboxUsage>,
    contained_units: Vec<ContainedUnitRecord>,
) -> SandboxRecord {
    let meta = sandbox.metadata.clone().unwrap_or_default();
    SandboxRecord {
        id: sandbox.id.clone(),
        uid: meta.uid,
        name: meta.name,
        namespace: meta.namespace,
        created_at: sandbox.created_at,
        state: sandbox_state(sandbox.state),
        attempt: meta.attempt,
        usage,
        contained_units,
    }
}

fn unit_record(container: &cri::Container, stats: &cri::ContainerStats) -> ContainedUnitRecord {
    let meta = container.metadata.clone().unwrap_or_default();
    let image = container
        .image
        .as_ref()
        .map(|i| i.image.clone())
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| container.image_ref.clone());

    ContainedUnitRecord {
        id: container.id.clone(),
        name: meta.name,
        image,
        created_at: container.created_at,
        state: unit_state(container.state),
        attempt: meta.attempt,
        cpu: stats.cpu.as_ref().map(cpu_usage),
        memory: stats.memory.as_ref().map(memory_usage),
        filesystem: stats.writable_layer.as_ref().map(filesystem_usage),
        swap: stats.swap.as_ref().map(swap_usage),
    }
}

fn cpu_usage(cpu: &cri::CpuUsage) -> CpuUsage {
    CpuUsage {
        timestamp: cpu.timestamp,
        usage_core_nano_seconds: value(&cpu.usage_core_nano_seconds),
        usage_nano_cores: value(&cpu.usage_nano_cores),
    }
}

fn memory_usage(mem: &cri::MemoryUsage) -> MemoryUsage {
    MemoryUsage {
        timestamp: mem.timestamp,
        working_set_bytes: value(&mem.working_set_bytes),
        available_bytes: value(&mem.available_bytes),
        usage_bytes: value(&mem.usage_bytes),
        rss_bytes: value(&mem.rss_bytes),
        page_faults: value(&mem.page_faults),
        major_page_faults: value(&mem.major_page_faults),
    }
}

fn filesystem_usage(fs: &cri::FilesystemUsage) -> FilesystemUsage {
    FilesystemUsage {
        timestamp: fs.timestamp,
        mountpoint: fs
            .fs_id
            .as_ref()
            .map(|id| id.mountpoint.clone())
            .filter(|m| !m.is_empty()),
        used_bytes: value(&fs.used_bytes),
        inodes_used: value(&fs.inodes_used),
    }
}

fn swap_usage(swap: &cri::SwapUsage) -> SwapUsage {
    SwapUsage {
        timestamp: swap.timestamp,
        available_bytes: value(&swap.swap_available_bytes),
        usage_bytes: value(&swap.swap_usage_bytes),
    }
}

fn sandbox_usage(linux: &cri::LinuxPodSandboxStats) -> SandboxUsage {
    let default_interface = linux
        .network
        .as_ref()
        .and_then(|n| n.default_interface.as_ref());

    SandboxUsage {
        cpu: linux.cpu.as_ref().map(cpu_usage),
        memory: linux.memory.as_ref().map(memory_usage),
        network_rx_bytes: default_interface.and_then(|i| value(&i.rx_bytes)),
        network_tx_bytes: default_interface.and_then(|i| value(&i.tx_bytes)),
        process_count: linux.process.as_ref().and_then(|p| value(&p.process_count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox(id: &str) -> cri::PodSandbox {
        cri::PodSandbox {
            id: id.to_string(),
            metadata: Some(cri::PodSandboxMetadata {
                name: format!("pod-{id}"),
                uid: format!("uid-{id}"),
                namespace: "default".to_string(),
                attempt: 0,
            }),
            state: cri::PodSandboxState::SandboxReady as i32,
            created_at: 1,
        }
    }

    fn container(id: &str, sandbox_id: &str) -> cri::Container {
        cri::Container {
            id: id.to_string(),
            pod_sandbox_id: sandbox_id.to_string(),
            metadata: Some(cri::ContainerMetadata {
                name: format!("ctr-{id}"),
                attempt: 2,
            }),
            image: Some(cri::ImageSpec {
                image: "nginx:1.25".to_string(),
            }),
            state: cri::ContainerState::ContainerRunning as i32,
            ..Default::default()
        }
    }

    fn stats(id: &str) -> cri::ContainerStats {
        cri::ContainerStats {
            attributes: Some(cri::ContainerAttributes {
                id: id.to_string(),
                metadata: None,
            }),
            cpu: Some(cri::CpuUsage {
                timestamp: 10,
                usage_core_nano_seconds: Some(cri::UInt64Value { value: 500 }),
                usage_nano_cores: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_containers_grouped_under_owning_sandbox() {
        let inventory = RawInventory {
            sandboxes: Some(vec![sandbox("p1"), sandbox("p2")]),
            sandbox_stats: Some(vec![]),
            containers: Some(vec![
                container("c1", "p2"),
                container("c2", "p1"),
                container("c3", "p2"),
            ]),
            container_stats: Some(vec![stats("c3"), stats("c1"), stats("c2")]),
        };

        let (records, errors) = correlate(&inventory, CorrelateOptions::default());

        assert!(errors.is_empty());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "p1");
        assert_eq!(records[0].contained_units.len(), 1);
        assert_eq!(records[0].contained_units[0].id, "c2");
        let p2: Vec<&str> = records[1]
            .contained_units
            .iter()
            .map(|u| u.id.as_str())
            .collect();
        assert_eq!(p2, vec!["c1", "c3"]);
        assert_eq!(records[1].contained_units[0].state, UnitState::Running);
        assert_eq!(records[1].contained_units[0].attempt, 2);
    }

    #[test]
    fn test_missing_stats_skips_unit_with_error() {
        let inventory = RawInventory {
            sandboxes: Some(vec![sandbox("p1")]),
            sandbox_stats: Some(vec![]),
            containers: Some(vec![container("c1", "p1"), container("c2", "p1")]),
            container_stats: Some(vec![stats("c2")]),
        };

        let (records, errors) = correlate(&inventory, CorrelateOptions::default());

        assert_eq!(records[0].contained_units.len(), 1);
        assert_eq!(records[0].contained_units[0].id, "c2");
        assert_eq!(
            errors,
            vec![AgentError::CorrelationMiss {
                container_id: "c1".into(),
                sandbox_id: "p1".into(),
                missing: Missing::Stats,
            }]
        );
    }

    #[test]
    fn test_failed_container_stats_yields_empty_units_without_errors() {
        let inventory = RawInventory {
            sandboxes: Some(vec![sandbox("p1")]),
            sandbox_stats: Some(vec![]),
            containers: Some(vec![container("c1", "p1")]),
            container_stats: None,
        };

        let (records, errors) = correlate(&inventory, CorrelateOptions { report_orphans: true });

        assert_eq!(records.len(), 1);
        assert!(records[0].contained_units.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_sandbox_without_containers_is_valid() {
        let inventory = RawInventory {
            sandboxes: Some(vec![sandbox("p1")]),
            containers: Some(vec![]),
            container_stats: Some(vec![]),
            ..Default::default()
        };

        let (records, errors) = correlate(&inventory, CorrelateOptions::default());
        assert_eq!(records.len(), 1);
        assert!(records[0].contained_units.is_empty());
        assert!(records[0].usage.is_none());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_orphans_reported_only_when_enabled() {
        let inventory = RawInventory {
            sandboxes: Some(vec![sandbox("p1")]),
            sandbox_stats: Some(vec![]),
            containers: Some(vec![container("c1", "gone")]),
            container_stats: Some(vec![stats("c1")]),
        };

        let (_, errors) = correlate(&inventory, CorrelateOptions::default());
        assert!(errors.is_empty());

        let (_, errors) = correlate(&inventory, CorrelateOptions { report_orphans: true });
        assert_eq!(
            errors,
            vec![AgentError::CorrelationMiss {
                container_id: "c1".into(),
                sandbox_id: "gone".into(),
                missing: Missing::Sandbox,
            }]
        );
    }

    #[test]
    fn test_failed_sandbox_listing_reports_no_orphans() {
        let inventory = RawInventory {
            sandboxes: None,
            sandbox_stats: Some(vec![]),
            containers: Some(vec![container("c1", "p1")]),
            container_stats: Some(vec![stats("c1")]),
        };

        let (records, errors) = correlate(&inventory, CorrelateOptions { report_orphans: true });
        assert!(records.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_sandbox_usage_joined_by_id() {
        let sandbox_stats = cri::PodSandboxStats {
            attributes: Some(cri::PodSandboxAttributes {
                id: "p1".into(),
                metadata: None,
            }),
            linux: Some(cri::LinuxPodSandboxStats {
                network: Some(cri::NetworkUsage {
                    default_interface: Some(cri::NetworkInterfaceUsage {
                        name: "eth0".into(),
                        rx_bytes: Some(cri::UInt64Value { value: 0 }),
                        tx_bytes: None,
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                process: Some(cri::ProcessUsage {
                    timestamp: 1,
                    process_count: Some(cri::UInt64Value { value: 4 }),
                }),
                ..Default::default()
            }),
        };
        let inventory = RawInventory {
            sandboxes: Some(vec![sandbox("p1")]),
            sandbox_stats: Some(vec![sandbox_stats]),
            containers: Some(vec![]),
            container_stats: Some(vec![]),
        };

        let (records, _) = correlate(&inventory, CorrelateOptions::default());
        let usage = records[0].usage.as_ref().unwrap();
        assert_eq!(usage.network_rx_bytes, Some(0));
        assert_eq!(usage.network_tx_bytes, None);
        assert_eq!(usage.process_count, Some(4));
        assert!(usage.cpu.is_none());
    }

    #[test]
    fn test_state_mapping() {
        assert_eq!(sandbox_state(0), SandboxState::Ready);
        assert_eq!(sandbox_state(1), SandboxState::NotReady);
        assert_eq!(sandbox_state(7), SandboxState::Unknown);
        assert_eq!(unit_state(0), UnitState::Created);
        assert_eq!(unit_state(2), UnitState::Exited);
        assert_eq!(unit_state(3), UnitState::Unknown);
        assert_eq!(unit_state(-1), UnitState::Unknown);
    }

    #[test]
    fn test_image_falls_back_to_image_ref() {
        let mut c = container("c1", "p1");
        c.image = None;
        c.image_ref = "sha256:abc".into();
        let unit = unit_record(&c, &stats("c1"));
        assert_eq!(unit.image, "sha256:abc");
    }
}
