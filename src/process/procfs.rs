use std::fs;
use std::path::{Path, PathBuf};

use crate::container::memory_cgroup_path;
use crate::error::ResultOkLogExt;
use crate::fsutil;

use super::{ProcessInfo, ProcessProvider};

/// Upper bound on bytes read from `/proc/<pid>/stat` and `/proc/<pid>/cgroup`.
const PROC_FILE_LIMIT: u64 = 4096;

/// [`ProcessProvider`] backed by a `/proc` filesystem.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl ProcFs {
    /// Creates a provider reading from `root`, normally `/proc`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pid_dir(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }

    fn read_process(&self, pid: u32) -> Option<ProcessInfo> {
        let content = fsutil::read_bounded(self.pid_dir(pid).join("stat"), PROC_FILE_LIMIT)
            .ok_debug()?;
        let (name, ppid) = parse_stat_line(&content)?;
        Some(ProcessInfo {
            pid,
            ppid,
            name: name.to_owned(),
        })
    }
}

impl ProcessProvider for ProcFs {
    fn processes(&self) -> Vec<ProcessInfo> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("failed to list `{}`: {}", self.root.display(), err);
                return Vec::new();
            }
        };

        let mut pids: Vec<u32> = entries
            .flatten()
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .collect();
        pids.sort_unstable();

        pids.into_iter()
            .filter_map(|pid| self.read_process(pid))
            .collect()
    }

    fn cmdline(&self, pid: u32, max_len: usize) -> Option<String> {
        let raw = fsutil::read_bounded(self.pid_dir(pid).join("cmdline"), max_len as u64)
            .ok_debug()?;
        let cmdline = raw.replace('\0', " ");
        let cmdline = cmdline.trim_end();
        if cmdline.is_empty() {
            return None;
        }
        Some(cmdline.to_owned())
    }

    fn cgroup_path(&self, pid: u32) -> Option<String> {
        let content = fsutil::read_bounded(self.pid_dir(pid).join("cgroup"), PROC_FILE_LIMIT)
            .ok_debug()?;
        memory_cgroup_path(&content).ok_debug().map(str::to_owned)
    }
}

/// Extracts `(comm, ppid)` from a `/proc/<pid>/stat` line.
///
/// `comm` is wrapped in parentheses and may itself contain spaces or `)`, so the name ends
/// at the *last* `)`.
fn parse_stat_line(line: &str) -> Option<(&str, u32)> {
    let open = line.find('(')?;
    let close = line.rfind(')')?;
    if close < open {
        return None;
    }
    let name = &line[open + 1..close];
    let mut rest = line[close + 1..].split_whitespace();
    let _state = rest.next()?;
    let ppid = rest.next()?.parse::<u32>().ok()?;
    Some((name, ppid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeHost;

    #[test]
    fn test_parse_stat_line() {
        let line = "1234 (stress) S 1200 1234 1200 0 -1 4194560 94 0 0 0 0 0";
        assert_eq!(parse_stat_line(line), Some(("stress", 1200)));
    }

    #[test]
    fn test_parse_stat_line_with_parens_in_name() {
        let line = "77 (weird) name) R 1 77 77 0";
        assert_eq!(parse_stat_line(line), Some(("weird) name", 1)));
    }

    #[test]
    fn test_parse_stat_line_garbage() {
        assert_eq!(parse_stat_line(""), None);
        assert_eq!(parse_stat_line("12 (x) S notanumber"), None);
    }

    #[test]
    fn test_processes_sorted_and_skips_non_pids() {
        let host = FakeHost::new();
        host.add_process(30, 1, "stress", "stress\0--cpu\01\0", None);
        host.add_process(4, 1, "bash", "bash\0", None);
        std::fs::create_dir_all(host.proc_root().join("self")).unwrap();
        std::fs::create_dir_all(host.proc_root().join("sys")).unwrap();

        let procfs = ProcFs::new(host.proc_root());
        let pids: Vec<u32> = procfs.processes().iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![4, 30]);
    }

    #[test]
    fn test_cmdline_replaces_separators_and_truncates() {
        let host = FakeHost::new();
        host.add_process(10, 1, "stress", "stress\0--vm\02\0--vm-bytes\0128M\0", None);
        let procfs = ProcFs::new(host.proc_root());

        assert_eq!(
            procfs.cmdline(10, 256).as_deref(),
            Some("stress --vm 2 --vm-bytes 128M")
        );
        assert_eq!(procfs.cmdline(10, 6).as_deref(), Some("stress"));
    }

    #[test]
    fn test_cmdline_missing_or_empty() {
        let host = FakeHost::new();
        host.add_process(11, 1, "kworker", "", None);
        let procfs = ProcFs::new(host.proc_root());

        assert_eq!(procfs.cmdline(11, 256), None);
        assert_eq!(procfs.cmdline(999, 256), None);
    }

    #[test]
    fn test_cgroup_path() {
        let host = FakeHost::new();
        host.add_process(12, 1, "stress", "stress\0", Some("abc"));
        host.add_process(13, 1, "sshd", "sshd\0", None);
        let procfs = ProcFs::new(host.proc_root());

        assert_eq!(
            procfs.cgroup_path(12).as_deref(),
            Some("/system.slice/docker-abc.scope")
        );
        assert_eq!(
            procfs.cgroup_path(13).as_deref(),
            Some("/system.slice/sshd.service")
        );
        assert_eq!(procfs.cgroup_path(999), None);
    }
}
