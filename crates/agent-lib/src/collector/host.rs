//! Host metrics source
//!
//! CPU, memory, filesystem, network and process data come from `sysinfo`.
//! Block device counters and pressure-stall data are read from `/proc`.

use super::psi;
use super::HostSource;
use crate::models::*;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use sysinfo::{Disks, Networks, ProcessesToUpdate, System};
use tracing::{debug, instrument};

/// Filesystem types reported as disk usage; pseudo and overlay mounts are skipped
const REAL_FILESYSTEMS: &[&str] = &[
    "ext4", "ext3", "ext2", "xfs", "btrfs", "zfs", "f2fs", "nilfs2", "ntfs", "exfat", "fat32",
    "vfat", "fat", "refs", "apfs", "hfs", "hfs+", "ufs", "ffs", "hammer", "hammer2", "ufs2", "nfs",
    "nfs4", "cifs", "smbfs", "glusterfs", "ceph", "lustre", "ocfs2", "gfs2",
];

/// Sector size used by `/proc/diskstats` regardless of the device
const DISKSTATS_SECTOR_BYTES: u64 = 512;

pub fn is_real_filesystem(fstype: &str) -> bool {
    REAL_FILESYSTEMS
        .iter()
        .any(|fs| fs.eq_ignore_ascii_case(fstype))
}

/// Sum `/proc/diskstats` counters, skipping loop and ram devices
pub fn parse_diskstats(content: &str) -> DiskIoSummary {
    let mut summary = DiskIoSummary::default();

    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }

        let name = fields[2];
        if name.starts_with("loop") || name.starts_with("ram") {
            continue;
        }

        let field = |i: usize| fields[i].parse::<u64>().unwrap_or(0);
        let sectors = |i: usize| field(i).saturating_mul(DISKSTATS_SECTOR_BYTES);
        summary.read_ops = summary.read_ops.saturating_add(field(3));
        summary.read_bytes = summary.read_bytes.saturating_add(sectors(5));
        summary.write_ops = summary.write_ops.saturating_add(field(7));
        summary.write_bytes = summary.write_bytes.saturating_add(sectors(9));
    }

    summary
}

struct HostState {
    sys: System,
    disks: Disks,
    networks: Networks,
}

/// `HostSource` backed by sysinfo and procfs
#[derive(Clone)]
pub struct HostCollector {
    state: Arc<Mutex<HostState>>,
    proc_root: PathBuf,
    machine_id_path: PathBuf,
}

impl Default for HostCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl HostCollector {
    pub fn new() -> Self {
        Self::with_proc_root("/proc")
    }

    /// Create a collector reading procfs files from a custom root (for testing)
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        Self {
            state: Arc::new(Mutex::new(HostState {
                sys,
                disks: Disks::new_with_refreshed_list(),
                networks: Networks::new_with_refreshed_list(),
            })),
            proc_root: proc_root.into(),
            machine_id_path: PathBuf::from("/etc/machine-id"),
        }
    }

    fn read_disk_io(proc_root: &Path) -> Option<DiskIoSummary> {
        let path = proc_root.join("diskstats");
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(parse_diskstats(&content)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Disk I/O counters unavailable");
                None
            }
        }
    }

    fn read_pressure(proc_root: &Path) -> Pressure {
        let read = |resource: &str| {
            let path = proc_root.join("pressure").join(resource);
            psi::read_pressure(&path)
                .map_err(|e| debug!(resource, error = %e, "Pressure data unavailable"))
                .ok()
        };

        Pressure {
            cpu: read("cpu"),
            memory: read("memory"),
            io: read("io"),
        }
    }

    fn gather(
        state: &mut HostState,
        proc_root: &Path,
        machine_id_path: &Path,
        top_n: usize,
    ) -> NodeMetrics {
        let HostState {
            sys,
            disks,
            networks,
        } = state;

        sys.refresh_cpu_all();
        sys.refresh_memory();
        sys.refresh_processes(ProcessesToUpdate::All, true);
        disks.refresh(false);
        networks.refresh(true);

        let host = HostInfo {
            hostname: System::host_name().unwrap_or_default(),
            uptime_secs: System::uptime(),
            boot_time: System::boot_time(),
            procs: sys.processes().len() as u64,
            os: std::env::consts::OS.to_string(),
            platform: System::distribution_id(),
            platform_version: System::os_version().unwrap_or_default(),
            kernel_version: System::kernel_version().unwrap_or_default(),
            kernel_arch: std::env::consts::ARCH.to_string(),
            host_id: std::fs::read_to_string(machine_id_path)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
        };

        let cpu = CpuSummary {
            usage_percent: sys.global_cpu_usage() as f64,
            physical_cores: System::physical_core_count().map(|n| n as u32),
            cores: sys
                .cpus()
                .iter()
                .enumerate()
                .map(|(i, c)| CoreInfo {
                    index: i as u32,
                    model: c.brand().to_string(),
                    vendor_id: c.vendor_id().to_string(),
                    mhz: c.frequency(),
                    usage_percent: c.cpu_usage() as f64,
                })
                .collect(),
        };

        let total = sys.total_memory();
        let available = sys.available_memory();
        let used = total.saturating_sub(available);
        let memory = MemoryInfo {
            total,
            available,
            used,
            free: sys.free_memory(),
            used_percent: percent(used, total),
        };

        let disk_usages = disks
            .list()
            .iter()
            .filter(|d| is_real_filesystem(&d.file_system().to_string_lossy()))
            .filter(|d| d.total_space() > 0)
            .map(|d| {
                let total = d.total_space();
                let free = d.available_space();
                let used = total.saturating_sub(free);
                DiskUsage {
                    device: d.name().to_string_lossy().into_owned(),
                    mountpoint: d.mount_point().to_string_lossy().into_owned(),
                    fstype: d.file_system().to_string_lossy().into_owned(),
                    total,
                    free,
                    used,
                    used_percent: percent(used, total),
                }
            })
            .collect();

        let mut network = NetworkSummary::default();
        for (name, data) in networks.list() {
            let totals = &mut network.totals;
            totals.bytes_sent += data.total_transmitted();
            totals.bytes_received += data.total_received();
            totals.packets_sent += data.total_packets_transmitted();
            totals.packets_received += data.total_packets_received();
            totals.errors_in += data.total_errors_on_received();
            totals.errors_out += data.total_errors_on_transmitted();

            network.interfaces.push(InterfaceInfo {
                name: name.clone(),
                hardware_addr: data.mac_address().to_string(),
                addrs: data
                    .ip_networks()
                    .iter()
                    .map(|n| format!("{}/{}", n.addr, n.prefix))
                    .collect(),
            });
        }
        network.interfaces.sort_by(|a, b| a.name.cmp(&b.name));

        let mut processes: Vec<ProcessMemory> = sys
            .processes()
            .values()
            .map(|p| ProcessMemory {
                pid: p.pid().as_u32(),
                name: p.name().to_string_lossy().into_owned(),
                rss: p.memory(),
            })
            .collect();
        processes.sort_by(|a, b| b.rss.cmp(&a.rss));
        processes.truncate(top_n);

        NodeMetrics {
            host,
            cpu,
            memory,
            disk_io: Self::read_disk_io(proc_root),
            disks: disk_usages,
            network,
            pressure: Self::read_pressure(proc_root),
            top_memory: processes,
        }
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

#[async_trait]
impl HostSource for HostCollector {
    #[instrument(skip(self), fields(source = "host"))]
    async fn collect(&self, top_n: usize) -> Result<NodeMetrics> {
        let state = self.state.clone();
        let proc_root = self.proc_root.clone();
        let machine_id_path = self.machine_id_path.clone();

        tokio::task::spawn_blocking(move || {
            let mut state = state
                .lock()
                .map_err(|e| anyhow!("sysinfo lock poisoned: {}", e))?;
            Ok(Self::gather(&mut state, &proc_root, &machine_id_path, top_n))
        })
        .await
        .context("sysinfo task join")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DISKSTATS: &str = "\
   7       0 loop0 100 0 2000 10 0 0 0 0 0 10 10 0 0 0 0
   1       0 ram0 5 0 10 0 5 0 10 0 0 0 0 0 0 0 0
   8       0 sda 1000 50 20000 300 400 20 8000 200 0 500 500 0 0 0 0
 259       0 nvme0n1 10 0 100 1 20 0 200 2 0 3 3 0 0 0 0
";

    #[test]
    fn test_parse_diskstats_skips_loop_and_ram() {
        let summary = parse_diskstats(DISKSTATS);
        assert_eq!(summary.read_ops, 1010);
        assert_eq!(summary.write_ops, 420);
        assert_eq!(summary.read_bytes, 20100 * 512);
        assert_eq!(summary.write_bytes, 8200 * 512);
    }

    #[test]
    fn test_parse_diskstats_ignores_short_lines() {
        let summary = parse_diskstats("8 0 sda 1 2\n\n");
        assert_eq!(summary, DiskIoSummary::default());
    }

    #[test]
    fn test_parse_diskstats_saturates_huge_counters() {
        let max = u64::MAX;
        let content = format!(
            "8 0 sda {max} 0 {max} 0 1 0 {max} 0 0 0 0\n8 16 sdb 5 0 4 0 1 0 2 0 0 0 0\n"
        );
        let summary = parse_diskstats(&content);
        assert_eq!(summary.read_ops, u64::MAX);
        assert_eq!(summary.read_bytes, u64::MAX);
        assert_eq!(summary.write_ops, 2);
        assert_eq!(summary.write_bytes, u64::MAX);
    }

    #[test]
    fn test_is_real_filesystem() {
        assert!(is_real_filesystem("ext4"));
        assert!(is_real_filesystem("XFS"));
        assert!(is_real_filesystem("nfs4"));
        assert!(!is_real_filesystem("overlay"));
        assert!(!is_real_filesystem("tmpfs"));
        assert!(!is_real_filesystem("proc"));
    }

    #[test]
    fn test_percent_handles_zero_total() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(25, 100), 25.0);
    }

    #[tokio::test]
    async fn test_collect_reads_procfs_tree() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("diskstats"), DISKSTATS).unwrap();
        std::fs::create_dir(dir.path().join("pressure")).unwrap();
        std::fs::write(
            dir.path().join("pressure/cpu"),
            "some avg10=1.00 avg60=0.50 avg300=0.25 total=100\n",
        )
        .unwrap();

        let collector = HostCollector::with_proc_root(dir.path());
        let node = collector.collect(3).await.unwrap();

        assert_eq!(node.disk_io.unwrap().read_ops, 1010);
        let cpu = node.pressure.cpu.unwrap();
        assert_eq!(cpu.some.total, 100);
        assert!(cpu.full.is_none());
        assert!(node.pressure.memory.is_none());
        assert!(node.pressure.io.is_none());
        assert!(node.top_memory.len() <= 3);
        assert!(node
            .top_memory
            .windows(2)
            .all(|w| w[0].rss >= w[1].rss));
    }

    #[tokio::test]
    async fn test_collect_without_diskstats() {
        let dir = TempDir::new().unwrap();
        let collector = HostCollector::with_proc_root(dir.path());
        let node = collector.collect(0).await.unwrap();

        assert!(node.disk_io.is_none());
        assert!(node.top_memory.is_empty());
    }
}
