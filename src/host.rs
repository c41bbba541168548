//! Host-wide memory and CPU figures.
//!
//! Memory comes from `/proc/meminfo` (`MemTotal`, `MemFree`, in kB). CPU usage is the share
//! of busy ticks (`user + nice + system`) in all counted ticks (`+ idle`) of the aggregate
//! `cpu` line of `/proc/stat`, i.e. the average since boot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::Serialize;

use crate::cgroup::stats::KeyValueStat;
use crate::error::ResultOkLogExt;
use crate::fixed::{Centi, KIB};
use crate::fsutil::{self, ReadError};

const PROC_READ_LIMIT: u64 = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("no aggregate `cpu` line in `{0}`")]
    MissingCpuLine(PathBuf),
    #[error("invalid `{field}` tick count `{value}` in `{path}`")]
    InvalidCpuField {
        path: PathBuf,
        field: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Host memory and CPU state for one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HostSnapshot {
    #[serde(rename = "Total_Memory_MB")]
    pub total_memory_mb: u64,
    #[serde(rename = "Free_Memory_MB")]
    pub free_memory_mb: u64,
    #[serde(rename = "Used_Memory_MB")]
    pub used_memory_mb: u64,
    #[serde(rename = "CPU_Usage_Percentage")]
    pub cpu_usage_percent: Centi,
    /// Total memory in bytes, the denominator of per-container memory percentages.
    #[serde(skip)]
    pub total_memory_bytes: u64,
}

/// The `/proc/meminfo` fields we care about, in kB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub total_kb: u64,
    pub free_kb: u64,
}

type Setter = fn(&mut MemInfo, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(2);
    m.insert("MemTotal:", |s, v| s.total_kb = v);
    m.insert("MemFree:", |s, v| s.free_kb = v);
    m
});

impl KeyValueStat for MemInfo {
    const SPLIT_CHAR: Option<char> = None;
    const SKIP_VALUES: usize = 0;
    const ALLOW_DUPLICATE_KEYS: bool = false;
    // `MemTotal:  16318480 kB`: the unit is not a key.
    const ALLOW_MULTIPLE_KV_PER_LINE: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, Setter> {
        &SETTERS
    }
}

/// Tick counters of the aggregate `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

impl CpuTicks {
    pub fn busy(&self) -> u64 {
        self.user.saturating_add(self.nice).saturating_add(self.system)
    }

    /// Busy share of all counted ticks, zero when nothing was counted yet.
    pub fn usage_percent(&self) -> Centi {
        let busy = self.busy();
        Centi::percent(busy, busy.saturating_add(self.idle))
    }
}

/// Reads host figures from a `/proc` tree.
#[derive(Debug, Clone)]
pub struct HostReader {
    proc_root: PathBuf,
}

impl HostReader {
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    /// Collects a fresh [`HostSnapshot`]. Blocking; unreadable sources yield zeros.
    pub fn snapshot(&self) -> HostSnapshot {
        let mem = self.mem_info().or_default_warn();
        let cpu = self.cpu_ticks().or_default_warn();

        let total_memory_mb = mem.total_kb / KIB;
        let free_memory_mb = mem.free_kb / KIB;
        HostSnapshot {
            total_memory_mb,
            free_memory_mb,
            used_memory_mb: total_memory_mb.saturating_sub(free_memory_mb),
            cpu_usage_percent: cpu.usage_percent(),
            total_memory_bytes: mem.total_kb.saturating_mul(KIB),
        }
    }

    pub fn mem_info(&self) -> Result<MemInfo> {
        let path = self.proc_root.join("meminfo");
        let content = fsutil::read_bounded(&path, PROC_READ_LIMIT)?;
        let (info, errors) = MemInfo::parse(&content);
        for err in errors {
            log::warn!("malformed `{}`: {}", path.display(), err);
        }
        Ok(info)
    }

    pub fn cpu_ticks(&self) -> Result<CpuTicks> {
        let path = self.proc_root.join("stat");
        let content = fsutil::read_bounded(&path, PROC_READ_LIMIT)?;
        parse_cpu_line(&path, &content)
    }
}

fn parse_cpu_line(path: &Path, content: &str) -> Result<CpuTicks> {
    let line = content
        .lines()
        .find(|line| line.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| Error::MissingCpuLine(path.to_path_buf()))?;

    let mut values = line.split_whitespace().skip(1);
    let mut next = |field: &'static str| -> Result<u64> {
        let raw = values.next().unwrap_or_default();
        raw.parse::<u64>().map_err(|_| Error::InvalidCpuField {
            path: path.to_path_buf(),
            field,
            value: raw.to_owned(),
        })
    };

    Ok(CpuTicks {
        user: next("user")?,
        nice: next("nice")?,
        system: next("system")?,
        idle: next("idle")?,
    })
}
