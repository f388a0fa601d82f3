//! Conversion of snapshots to relay wire messages
//!
//! Absent counters stay absent on the wire through proto3 `optional`.

use crate::models::*;
use crate::proto::relay::v1 as relay;

pub fn to_metrics(snapshot: &Snapshot) -> relay::Metrics {
    relay::Metrics {
        timestamp: snapshot.timestamp,
        node_metrics: snapshot.node.as_ref().map(node_metrics),
        pod_metrics: snapshot.units.iter().map(pod_metrics).collect(),
    }
}

fn node_metrics(node: &NodeMetrics) -> relay::NodeMetrics {
    let host = &node.host;
    let net = &node.network.totals;

    relay::NodeMetrics {
        hostname: host.hostname.clone(),
        uptime: host.uptime_secs,
        boot_time: host.boot_time,
        procs: host.procs,
        os: host.os.clone(),
        platform: host.platform.clone(),
        platform_version: host.platform_version.clone(),
        kernel_version: host.kernel_version.clone(),
        kernel_arch: host.kernel_arch.clone(),
        host_id: host.host_id.clone(),
        total_cpu_percentage: node.cpu.usage_percent,
        physical_cores: node.cpu.physical_cores,
        cpu_infos: node
            .cpu
            .cores
            .iter()
            .map(|c| relay::CpuInfo {
                cpu: c.index,
                model: c.model.clone(),
                vendor_id: c.vendor_id.clone(),
                mhz: c.mhz,
                usage: c.usage_percent,
            })
            .collect(),
        total_memory: node.memory.total,
        available_memory: node.memory.available,
        used_memory: node.memory.used,
        free_memory: node.memory.free,
        memory_used_perc: node.memory.used_percent,
        net_usage: Some(relay::NetUsage {
            total_bytes_sent: net.bytes_sent,
            total_bytes_received: net.bytes_received,
            total_packets_sent: net.packets_sent,
            total_packets_received: net.packets_received,
            total_err_in: net.errors_in,
            total_err_out: net.errors_out,
        }),
        network_interfaces: node
            .network
            .interfaces
            .iter()
            .map(|i| relay::InterfaceStat {
                name: i.name.clone(),
                hardware_addr: i.hardware_addr.clone(),
                addrs: i.addrs.clone(),
            })
            .collect(),
        disk_usages: node
            .disks
            .iter()
            .map(|d| relay::DiskUsage {
                device: d.device.clone(),
                mountpoint: d.mountpoint.clone(),
                fstype: d.fstype.clone(),
                total: d.total,
                free: d.free,
                used: d.used,
                used_percent: d.used_percent,
            })
            .collect(),
        disk_io_summary: node.disk_io.as_ref().map(|io| relay::DiskIoSummary {
            total_read_bytes: io.read_bytes,
            total_write_bytes: io.write_bytes,
            total_read_ops: io.read_ops,
            total_write_ops: io.write_ops,
        }),
        psi_cpu_metrics: node.pressure.cpu.as_ref().map(psi_metrics),
        psi_memory_metrics: node.pressure.memory.as_ref().map(psi_metrics),
        psi_io_metrics: node.pressure.io.as_ref().map(psi_metrics),
        top_mem: node
            .top_memory
            .iter()
            .map(|p| relay::ProcessMemInfo {
                pid: p.pid,
                name: p.name.clone(),
                memory: p.rss,
            })
            .collect(),
    }
}

fn psi_data(data: &PsiData) -> relay::PsiData {
    relay::PsiData {
        avg10: data.avg10,
        avg60: data.avg60,
        avg300: data.avg300,
        total: data.total,
    }
}

fn psi_metrics(psi: &PsiMetrics) -> relay::PsiMetrics {
    relay::PsiMetrics {
        some: Some(psi_data(&psi.some)),
        full: psi.full.as_ref().map(psi_data),
    }
}

fn pod_state(state: SandboxState) -> relay::PodState {
    match state {
        SandboxState::Ready => relay::PodState::Ready,
        SandboxState::NotReady => relay::PodState::NotReady,
        SandboxState::Unknown => relay::PodState::Unknown,
    }
}

fn container_state(state: UnitState) -> relay::ContainerState {
    match state {
        UnitState::Created => relay::ContainerState::Created,
        UnitState::Running => relay::ContainerState::Running,
        UnitState::Exited => relay::ContainerState::Exited,
        UnitState::Unknown => relay::ContainerState::Unknown,
    }
}

fn pod_metrics(sandbox: &SandboxRecord) -> relay::PodMetrics {
    relay::PodMetrics {
        id: sandbox.id.clone(),
        uid: sandbox.uid.clone(),
        name: sandbox.name.clone(),
        namespace: sandbox.namespace.clone(),
        created_at: sandbox.created_at,
        state: pod_state(sandbox.state) as i32,
        attempt: sandbox.attempt,
        container_metrics: sandbox
            .contained_units
            .iter()
            .map(container_metrics)
            .collect(),
        usage: sandbox.usage.as_ref().map(|u| relay::PodUsage {
            cpu_metrics: u.cpu.as_ref().map(cpu_metrics),
            memory_metrics: u.memory.as_ref().map(memory_metrics),
            network_rx_bytes: u.network_rx_bytes,
            network_tx_bytes: u.network_tx_bytes,
            process_count: u.process_count,
        }),
    }
}

fn container_metrics(unit: &ContainedUnitRecord) -> relay::ContainerMetrics {
    relay::ContainerMetrics {
        id: unit.id.clone(),
        name: unit.name.clone(),
        image: unit.image.clone(),
        created_at: unit.created_at,
        state: container_state(unit.state) as i32,
        attempt: unit.attempt,
        cpu_metrics: unit.cpu.as_ref().map(cpu_metrics),
        memory_metrics: unit.memory.as_ref().map(memory_metrics),
        file_system_metrics: unit.filesystem.as_ref().map(|fs| relay::FileSystemMetrics {
            timestamp: fs.timestamp,
            mountpoint: fs.mountpoint.clone(),
            used_bytes: fs.used_bytes,
            inodes_used: fs.inodes_used,
        }),
        swap_metrics: unit.swap.as_ref().map(|s| relay::SwapMetrics {
            timestamp: s.timestamp,
            swap_available_bytes: s.available_bytes,
            swap_usage_bytes: s.usage_bytes,
        }),
    }
}

fn cpu_metrics(cpu: &CpuUsage) -> relay::CpuMetrics {
    relay::CpuMetrics {
        timestamp: cpu.timestamp,
        usage_core_nano_seconds: cpu.usage_core_nano_seconds,
        usage_nano_cores: cpu.usage_nano_cores,
    }
}

fn memory_metrics(mem: &MemoryUsage) -> relay::MemoryMetrics {
    relay::MemoryMetrics {
        timestamp: mem.timestamp,
        working_set_bytes: mem.working_set_bytes,
        available_bytes: mem.available_bytes,
        usage_bytes: mem.usage_bytes,
        rss_bytes: mem.rss_bytes,
        page_faults: mem.page_faults,
        major_page_faults: mem.major_page_faults,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    fn unit(cpu: Option<CpuUsage>) -> ContainedUnitRecord {
        ContainedUnitRecord {
            id: "c1".into(),
            name: "app".into(),
            image: "busybox".into(),
            created_at: 5,
            state: UnitState::Exited,
            attempt: 1,
            cpu,
            memory: None,
            filesystem: None,
            swap: None,
        }
    }

    fn snapshot(units: Vec<ContainedUnitRecord>) -> Snapshot {
        Snapshot {
            timestamp: 1_700_000_000,
            node: None,
            units: vec![SandboxRecord {
                id: "p1".into(),
                uid: "u1".into(),
                name: "pod".into(),
                namespace: "ns".into(),
                created_at: 1,
                state: SandboxState::NotReady,
                attempt: 0,
                usage: None,
                contained_units: units,
            }],
        }
    }

    #[test]
    fn test_zero_counter_survives_encoding() {
        let cpu = CpuUsage {
            timestamp: 1,
            usage_core_nano_seconds: Some(0),
            usage_nano_cores: None,
        };
        let encoded = to_metrics(&snapshot(vec![unit(Some(cpu))])).encode_to_vec();
        let decoded = relay::Metrics::decode(encoded.as_slice()).unwrap();

        let cpu = decoded.pod_metrics[0].container_metrics[0]
            .cpu_metrics
            .clone()
            .unwrap();
        assert_eq!(cpu.usage_core_nano_seconds, Some(0));
        assert_eq!(cpu.usage_nano_cores, None);
    }

    #[test]
    fn test_states_and_absent_facets() {
        let metrics = to_metrics(&snapshot(vec![unit(None)]));
        let pod = &metrics.pod_metrics[0];

        assert_eq!(pod.state, relay::PodState::NotReady as i32);
        assert_eq!(
            pod.container_metrics[0].state,
            relay::ContainerState::Exited as i32
        );
        assert!(pod.container_metrics[0].cpu_metrics.is_none());
        assert!(pod.usage.is_none());
        assert!(metrics.node_metrics.is_none());
    }

    #[test]
    fn test_node_pressure_without_full_line() {
        let node = NodeMetrics {
            pressure: Pressure {
                cpu: Some(PsiMetrics {
                    some: PsiData {
                        avg10: 1.0,
                        ..Default::default()
                    },
                    full: None,
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        let metrics = to_metrics(&Snapshot {
            timestamp: 0,
            node: Some(node),
            units: vec![],
        });

        let node = metrics.node_metrics.unwrap();
        let cpu = node.psi_cpu_metrics.unwrap();
        assert_eq!(cpu.some.unwrap().avg10, 1.0);
        assert!(cpu.full.is_none());
        assert!(node.psi_io_metrics.is_none());
        assert!(node.disk_io_summary.is_none());
    }
}
