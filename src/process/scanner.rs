//! Selection of the processes that represent containers.
//!
//! A load generator running inside a container typically forks workers with the same
//! name. Only the supervising process (the one with at least one child) is selected, which
//! yields one representative per workload instead of one per worker.

use std::collections::HashSet;

use super::ProcessProvider;

/// Maximum bytes of command line captured per process.
pub const CMDLINE_MAX_LEN: usize = 256;

/// A process accepted by the [`ProcessScanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedProcess {
    pub pid: u32,
    pub name: String,
    /// Best-effort command line, `None` if it could not be read.
    pub cmdline: Option<String>,
}

/// Filters process enumerations down to supervising processes with a target name.
#[derive(Debug, Clone)]
pub struct ProcessScanner {
    target: String,
    cmdline_max_len: usize,
}

impl ProcessScanner {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            cmdline_max_len: CMDLINE_MAX_LEN,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns every process named exactly like the target that has at least one child,
    /// in enumeration order, with its command line attached.
    pub fn scan(&self, provider: &dyn ProcessProvider) -> Vec<ScannedProcess> {
        let processes = provider.processes();
        let parents: HashSet<u32> = processes
            .iter()
            .filter(|p| p.ppid != p.pid)
            .map(|p| p.ppid)
            .collect();

        processes
            .into_iter()
            .filter(|p| p.name == self.target && parents.contains(&p.pid))
            .map(|p| {
                let cmdline = provider.cmdline(p.pid, self.cmdline_max_len);
                if cmdline.is_none() {
                    log::debug!("could not read command line of pid {}", p.pid);
                }
                ScannedProcess {
                    pid: p.pid,
                    name: p.name,
                    cmdline,
                }
            })
            .collect()
    }
}
