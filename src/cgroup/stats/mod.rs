//! Typed views of the cgroup v2 accounting files read for each container.
//!
//! Each submodule parses one file format into a plain struct of `u64` counters:
//!
//! - [`CpuStat`] from `cpu.stat`
//! - [`MemoryUsage`] from `memory.current`
//! - [`MemoryStat`] from `memory.stat`
//! - [`IoStat`] from `io.stat`
//!
//! The parsers are lossy (see [`KeyValueStat`]); [`CgroupStats`] bundles the four results
//! for one container and one poll.

mod cpu;
mod error;
mod io;
mod memory;
mod parser;

pub use cpu::CpuStat;
pub use error::StatParseError;
pub use io::IoStat;
pub use memory::{MemoryStat, MemoryUsage};
pub use parser::{KeyValueStat, Parsed, SingleLineStat};

/// The full set of accounting values read for a container in one poll.
///
/// A file that could not be read contributes its all-zero default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CgroupStats {
    /// Resident memory from `memory.current`.
    pub memory_usage: MemoryUsage,
    /// Memory breakdown from `memory.stat`.
    pub memory_stat: MemoryStat,
    /// CPU time from `cpu.stat`.
    pub cpu_stat: CpuStat,
    /// Block I/O from `io.stat`.
    pub io_stat: IoStat,
}
