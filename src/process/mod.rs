//! Process discovery.
//!
//! [`ProcessProvider`] is the seam between the collector and the operating system: it lists
//! processes with their parent relationship, and reads a process's command line and cgroup
//! membership on demand. [`ProcFs`] implements it over the `/proc` pseudo-filesystem with
//! ordinary reads, so only read access is needed. [`ProcessScanner`] applies the target
//! filter on top of any provider.

mod procfs;
mod scanner;

pub use procfs::ProcFs;
pub use scanner::{CMDLINE_MAX_LEN, ProcessScanner, ScannedProcess};

/// A live process as seen in one enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Parent process id; `0` for processes without a parent.
    pub ppid: u32,
    /// Short process name (the kernel's `comm`).
    pub name: String,
}

/// Source of process information.
///
/// Every method is best-effort: a process can exit between enumeration and a later
/// lookup, which simply yields `None`.
pub trait ProcessProvider: Send + Sync {
    /// Lists all live processes in ascending pid order.
    fn processes(&self) -> Vec<ProcessInfo>;

    /// Reads the command line of `pid`, at most `max_len` bytes, with argument separators
    /// replaced by spaces.
    fn cmdline(&self, pid: u32, max_len: usize) -> Option<String>;

    /// Returns the memory-controller cgroup path of `pid`.
    fn cgroup_path(&self, pid: u32) -> Option<String>;
}
