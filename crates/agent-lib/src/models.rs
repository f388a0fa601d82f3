//! Core data models for the telemetry agent

use serde::{Deserialize, Serialize};

/// One complete collection of node and workload metrics for a single tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Capture instant, unix seconds
    pub timestamp: i64,
    /// Host metrics, absent when the host source failed this tick
    pub node: Option<NodeMetrics>,
    /// Sandboxes in runtime list order
    pub units: Vec<SandboxRecord>,
}

impl Snapshot {
    /// Total number of contained units across all sandboxes
    pub fn container_count(&self) -> usize {
        self.units.iter().map(|s| s.contained_units.len()).sum()
    }
}

/// Host-level metrics record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub host: HostInfo,
    pub cpu: CpuSummary,
    pub memory: MemoryInfo,
    pub disk_io: Option<DiskIoSummary>,
    pub disks: Vec<DiskUsage>,
    pub network: NetworkSummary,
    pub pressure: Pressure,
    pub top_memory: Vec<ProcessMemory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    pub hostname: String,
    pub uptime_secs: u64,
    pub boot_time: u64,
    pub procs: u64,
    pub os: String,
    pub platform: String,
    pub platform_version: String,
    pub kernel_version: String,
    pub kernel_arch: String,
    pub host_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuSummary {
    /// Aggregate utilization over all cores, percent
    pub usage_percent: f64,
    pub physical_cores: Option<u32>,
    pub cores: Vec<CoreInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreInfo {
    pub index: u32,
    pub model: String,
    pub vendor_id: String,
    pub mhz: u64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub free: u64,
    pub used_percent: f64,
}

/// Cumulative block device counters summed over physical devices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskIoSummary {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_ops: u64,
    pub write_ops: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub totals: NetUsage,
    pub interfaces: Vec<InterfaceInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetUsage {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub errors_in: u64,
    pub errors_out: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub name: String,
    pub hardware_addr: String,
    pub addrs: Vec<String>,
}

/// Pressure-stall information per resource class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pressure {
    pub cpu: Option<PsiMetrics>,
    pub memory: Option<PsiMetrics>,
    pub io: Option<PsiMetrics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PsiMetrics {
    pub some: PsiData,
    /// Not reported for cpu on older kernels
    pub full: Option<PsiData>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PsiData {
    pub avg10: f64,
    pub avg60: f64,
    pub avg300: f64,
    /// Total stall time, microseconds
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessMemory {
    pub pid: u32,
    pub name: String,
    /// Resident set size in bytes
    pub rss: u64,
}

/// Runtime-reported sandbox lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxState {
    Ready,
    NotReady,
    Unknown,
}

/// Runtime-reported container lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    Created,
    Running,
    Exited,
    Unknown,
}

/// One workload sandbox (a pod)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxRecord {
    pub id: String,
    pub uid: String,
    pub name: String,
    pub namespace: String,
    /// Creation time, unix nanoseconds as reported by the runtime
    pub created_at: i64,
    pub state: SandboxState,
    pub attempt: u32,
    /// Sandbox-level usage, absent when no stats record matched
    pub usage: Option<SandboxUsage>,
    pub contained_units: Vec<ContainedUnitRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SandboxUsage {
    pub cpu: Option<CpuUsage>,
    pub memory: Option<MemoryUsage>,
    pub network_rx_bytes: Option<u64>,
    pub network_tx_bytes: Option<u64>,
    pub process_count: Option<u64>,
}

/// One container inside a sandbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainedUnitRecord {
    pub id: String,
    pub name: String,
    pub image: String,
    pub created_at: i64,
    pub state: UnitState,
    pub attempt: u32,
    pub cpu: Option<CpuUsage>,
    pub memory: Option<MemoryUsage>,
    pub filesystem: Option<FilesystemUsage>,
    pub swap: Option<SwapUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuUsage {
    pub timestamp: i64,
    pub usage_core_nano_seconds: Option<u64>,
    pub usage_nano_cores: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub timestamp: i64,
    pub working_set_bytes: Option<u64>,
    pub available_bytes: Option<u64>,
    pub usage_bytes: Option<u64>,
    pub rss_bytes: Option<u64>,
    pub page_faults: Option<u64>,
    pub major_page_faults: Option<u64>,
}

/// Writable layer usage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilesystemUsage {
    pub timestamp: i64,
    pub mountpoint: Option<String>,
    pub used_bytes: Option<u64>,
    pub inodes_used: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapUsage {
    pub timestamp: i64,
    pub available_bytes: Option<u64>,
    pub usage_bytes: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(cpu: Option<CpuUsage>) -> ContainedUnitRecord {
        ContainedUnitRecord {
            id: "c1".to_string(),
            name: "app".to_string(),
            image: "registry.local/app:1".to_string(),
            created_at: 0,
            state: UnitState::Running,
            attempt: 0,
            cpu,
            memory: None,
            filesystem: None,
            swap: None,
        }
    }

    #[test]
    fn test_absent_counter_serializes_as_null() {
        let json = serde_json::to_value(unit(Some(CpuUsage {
            timestamp: 1,
            usage_core_nano_seconds: Some(0),
            usage_nano_cores: None,
        })))
        .unwrap();

        assert_eq!(json["cpu"]["usage_core_nano_seconds"], 0);
        assert!(json["cpu"]["usage_nano_cores"].is_null());
        assert!(json["memory"].is_null());
        assert_eq!(json["state"], "running");
    }

    #[test]
    fn test_container_count_spans_sandboxes() {
        let sandbox = |units: Vec<ContainedUnitRecord>| SandboxRecord {
            id: "s".to_string(),
            uid: String::new(),
            name: String::new(),
            namespace: String::new(),
            created_at: 0,
            state: SandboxState::Ready,
            attempt: 0,
            usage: None,
            contained_units: units,
        };
        let snapshot = Snapshot {
            timestamp: 0,
            node: None,
            units: vec![sandbox(vec![unit(None), unit(None)]), sandbox(vec![]), sandbox(vec![unit(None)])],
        };

        assert_eq!(snapshot.container_count(), 3);
    }

    #[test]
    fn test_snapshot_json_round_trip_keeps_absence() {
        let snapshot = Snapshot {
            timestamp: 1_700_000_000,
            node: None,
            units: vec![],
        };
        let decoded: Snapshot =
            serde_json::from_str(&serde_json::to_string(&snapshot).unwrap()).unwrap();
        assert_eq!(decoded, snapshot);
        assert!(decoded.node.is_none());
    }
}
