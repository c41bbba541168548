use serde::Serialize;

use crate::cgroup::stats::CgroupStats;
use crate::container::ContainerID;
use crate::fixed::{Centi, KIB};
use crate::host::HostSnapshot;
use crate::process::ScannedProcess;
use crate::tracker::Rates;

/// Placeholder for a command line that could not be read.
pub const CMDLINE_UNAVAILABLE: &str = "N/A";

/// The document produced by one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    #[serde(rename = "Memory")]
    pub host: HostSnapshot,
    /// One record per container, in the order the containers were first seen in the scan.
    #[serde(rename = "Docker_Containers")]
    pub containers: Vec<ContainerRecord>,
}

/// Resource usage of one container, represented by its first qualifying process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerRecord {
    #[serde(rename = "PID")]
    pub pid: u32,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ContainerID")]
    pub container_id: ContainerID,
    #[serde(rename = "Cmdline")]
    pub cmdline: String,
    #[serde(rename = "MemoryUsage_percent")]
    pub memory_usage_percent: Centi,
    #[serde(rename = "MemoryUsage_MB")]
    pub memory_usage_mb: Centi,
    #[serde(rename = "CPUUsage_percent")]
    pub cpu_usage_percent: Centi,
    /// Bytes read plus written since the container started.
    #[serde(rename = "DiskUse_MB")]
    pub disk_use_mb: Centi,
    /// Write throughput in KiB/s.
    #[serde(rename = "Write_KBytes")]
    pub write_kbytes: u64,
    /// Read throughput in KiB/s.
    #[serde(rename = "Read_KBytes")]
    pub read_kbytes: u64,
    #[serde(rename = "IOReadOps")]
    pub io_read_ops: u64,
    #[serde(rename = "IOWriteOps")]
    pub io_write_ops: u64,
}

impl ContainerRecord {
    /// Assembles a record from the representative process, the container's raw stats and
    /// the rates derived from them.
    ///
    /// `host_total_bytes` is the denominator of the memory percentage.
    pub fn new(
        process: ScannedProcess,
        container_id: ContainerID,
        stats: &CgroupStats,
        rates: Rates,
        host_total_bytes: u64,
    ) -> Self {
        let memory_bytes = stats.memory_usage.usage_bytes;
        let io = &stats.io_stat;
        Self {
            pid: process.pid,
            name: process.name,
            container_id,
            cmdline: process
                .cmdline
                .unwrap_or_else(|| CMDLINE_UNAVAILABLE.to_owned()),
            memory_usage_percent: Centi::percent(memory_bytes, host_total_bytes),
            memory_usage_mb: Centi::mebibytes(memory_bytes),
            cpu_usage_percent: rates.cpu_percent,
            disk_use_mb: Centi::mebibytes(io.rbytes.saturating_add(io.wbytes)),
            write_kbytes: rates.write_bytes_per_sec / KIB,
            read_kbytes: rates.read_bytes_per_sec / KIB,
            io_read_ops: io.rios,
            io_write_ops: io.wios,
        }
    }
}
