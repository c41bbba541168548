//! Parsing of the cgroup v2 memory files.
//!
//! - `memory.current` holds one number, the resident memory of the group in bytes, and is
//!   parsed into [`MemoryUsage`].
//! - `memory.stat` holds one `key value` pair per line and is parsed into [`MemoryStat`].
//!
//! # Examples
//!
//! ```rust
//! use docker_sysinfo::cgroup::stats::{KeyValueStat, MemoryStat, MemoryUsage, SingleLineStat};
//!
//! let (mem_stat, _) = MemoryStat::parse("anon 1000\nkernel 300\nkernel_stack 16\n");
//! assert_eq!(mem_stat.kernel, 300);
//!
//! let (mem_usage, _) = MemoryUsage::parse("104857600\n");
//! assert_eq!(mem_usage.usage_bytes, 104_857_600);
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use super::parser::{KeyValueStat, Parsed, parse_single_u64};
use super::SingleLineStat;

/// Memory breakdown from `memory.stat`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryStat {
    /// Anonymous memory.
    pub anon: u64,
    /// File-backed memory.
    pub file: u64,
    /// Total kernel memory charged to the group.
    pub kernel: u64,
    /// Kernel stack memory.
    pub kernel_stack: u64,
}

impl MemoryStat {
    fn set_anon(&mut self, v: u64) {
        self.anon = v;
    }

    fn set_file(&mut self, v: u64) {
        self.file = v;
    }

    fn set_kernel(&mut self, v: u64) {
        self.kernel = v;
    }

    fn set_kernel_stack(&mut self, v: u64) {
        self.kernel_stack = v;
    }
}

type Setter = fn(&mut MemoryStat, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(4);

    m.insert("anon", MemoryStat::set_anon);
    m.insert("file", MemoryStat::set_file);
    m.insert("kernel", MemoryStat::set_kernel);
    m.insert("kernel_stack", MemoryStat::set_kernel_stack);

    m
});

impl KeyValueStat for MemoryStat {
    const SPLIT_CHAR: Option<char> = None;
    const SKIP_VALUES: usize = 0;
    const ALLOW_DUPLICATE_KEYS: bool = false;
    const ALLOW_MULTIPLE_KV_PER_LINE: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}

/// Current memory usage from `memory.current`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    /// Total memory usage in bytes.
    pub usage_bytes: u64,
}

impl SingleLineStat for MemoryUsage {
    fn parse(content: &str) -> Parsed<Self> {
        match parse_single_u64(content) {
            Ok(usage_bytes) => (MemoryUsage { usage_bytes }, Vec::new()),
            Err(err) => (MemoryUsage::default(), vec![err]),
        }
    }
}
