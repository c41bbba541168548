//! Parsing of the cgroup v2 `cpu.stat` file.
//!
//! The file holds one whitespace-separated key/value pair per line. Only `usage_usec`
//! feeds the snapshot (as the cumulative counter the rate tracker differences); the
//! remaining fields are kept for diagnostics.
//!
//! # Examples
//!
//! ```rust
//! use docker_sysinfo::cgroup::stats::{CpuStat, KeyValueStat};
//!
//! let (cpu_stat, errors) = CpuStat::parse("usage_usec 5000000\nnr_periods 3\n");
//! assert_eq!(cpu_stat.usage_usec, 5_000_000);
//! assert_eq!(cpu_stat.nr_periods, 3);
//! assert!(errors.is_empty());
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use super::KeyValueStat;

/// Represents parsed data from a cgroup `cpu.stat` file.
///
/// All fields correspond to values provided by the Linux kernel in microseconds (`_usec`)
/// or counts (`nr_*`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuStat {
    /// Total time (in microseconds) that the cgroup used CPU (user + system).
    pub usage_usec: u64,
    /// Time (in microseconds) spent in user space.
    pub user_usec: u64,
    /// Time (in microseconds) spent in kernel (system) space.
    pub system_usec: u64,
    /// Number of enforcement periods that have elapsed.
    pub nr_periods: u64,
    /// Number of periods in which the cgroup was throttled.
    pub nr_throttled: u64,
    /// Total time (in microseconds) the cgroup was throttled.
    pub throttled_usec: u64,
}

impl CpuStat {
    fn set_usage_usec(&mut self, usage_usec: u64) {
        self.usage_usec = usage_usec;
    }

    fn set_user_usec(&mut self, user_usec: u64) {
        self.user_usec = user_usec;
    }

    fn set_system_usec(&mut self, system_usec: u64) {
        self.system_usec = system_usec;
    }

    fn set_nr_periods(&mut self, nr_periods: u64) {
        self.nr_periods = nr_periods;
    }

    fn set_nr_throttled(&mut self, nr_throttled: u64) {
        self.nr_throttled = nr_throttled;
    }

    fn set_throttled_usec(&mut self, throttled_usec: u64) {
        self.throttled_usec = throttled_usec;
    }
}

type Setter = fn(&mut CpuStat, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(6);

    m.insert("usage_usec", CpuStat::set_usage_usec);
    m.insert("user_usec", CpuStat::set_user_usec);
    m.insert("system_usec", CpuStat::set_system_usec);
    m.insert("nr_periods", CpuStat::set_nr_periods);
    m.insert("nr_throttled", CpuStat::set_nr_throttled);
    m.insert("throttled_usec", CpuStat::set_throttled_usec);

    m
});

impl KeyValueStat for CpuStat {
    const SPLIT_CHAR: Option<char> = None;
    const SKIP_VALUES: usize = 0;
    const ALLOW_DUPLICATE_KEYS: bool = false;
    const ALLOW_MULTIPLE_KV_PER_LINE: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}
