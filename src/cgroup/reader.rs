use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::container::ContainerID;
use crate::error::ResultOkLogExt;
use crate::fsutil;

use super::stats::{
    CgroupStats, CpuStat, IoStat, KeyValueStat, MemoryStat, MemoryUsage, Parsed, SingleLineStat,
};

pub const MEMORY_CURRENT: &str = "memory.current";
pub const MEMORY_STAT: &str = "memory.stat";
pub const CPU_STAT: &str = "cpu.stat";
pub const IO_STAT: &str = "io.stat";

/// Upper bound on the bytes read from any single accounting file.
const STAT_READ_LIMIT: u64 = 16 * 1024;

/// Reads the accounting files of Docker containers from a cgroup v2 hierarchy.
///
/// Files are looked up at `<root>/<slice>/docker-<id>.scope/`. Every file is read with its
/// own timeout; a file that is missing, unreadable, slow or malformed contributes zeros and
/// a warning instead of failing the read.
#[derive(Debug, Clone)]
pub struct StatReader {
    root: PathBuf,
    slice: String,
    read_timeout: Duration,
}

impl StatReader {
    /// Creates a reader for the hierarchy mounted at `root`.
    ///
    /// # Arguments
    ///
    /// * `root` - The cgroup v2 mount point, e.g. `/sys/fs/cgroup`.
    /// * `slice` - The slice directory holding container scopes, e.g. `system.slice`.
    /// * `read_timeout` - How long a single file read may take.
    pub fn new(root: impl Into<PathBuf>, slice: impl Into<String>, read_timeout: Duration) -> Self {
        Self {
            root: root.into(),
            slice: slice.into(),
            read_timeout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the scope directory of the given container.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::time::Duration;
    /// # use std::path::PathBuf;
    /// # use docker_sysinfo::cgroup::StatReader;
    /// # use docker_sysinfo::container::ContainerID;
    /// let reader = StatReader::new("/sys/fs/cgroup", "system.slice", Duration::from_millis(100));
    /// let id = ContainerID::new("abc123").unwrap();
    /// assert_eq!(
    ///     reader.container_dir(&id),
    ///     PathBuf::from("/sys/fs/cgroup/system.slice/docker-abc123.scope")
    /// );
    /// ```
    pub fn container_dir(&self, container_id: &ContainerID) -> PathBuf {
        self.root
            .join(&self.slice)
            .join(format!("docker-{container_id}.scope"))
    }

    /// Reads and parses all accounting files of one container.
    ///
    /// The four files are read concurrently. This never fails; see the type-level docs.
    pub async fn read(&self, container_id: &ContainerID) -> CgroupStats {
        let dir = self.container_dir(container_id);
        let (memory_usage, memory_stat, cpu_stat, io_stat) = tokio::join!(
            self.read_file(container_id, &dir, MEMORY_CURRENT, MemoryUsage::parse),
            self.read_file(container_id, &dir, MEMORY_STAT, MemoryStat::parse),
            self.read_file(container_id, &dir, CPU_STAT, CpuStat::parse),
            self.read_file(container_id, &dir, IO_STAT, IoStat::parse),
        );

        CgroupStats {
            memory_usage,
            memory_stat,
            cpu_stat,
            io_stat,
        }
    }

    async fn read_file<T: Default>(
        &self,
        container_id: &ContainerID,
        dir: &Path,
        file_name: &'static str,
        parse: fn(&str) -> Parsed<T>,
    ) -> T {
        let path = dir.join(file_name);
        let Some(content) =
            fsutil::read_bounded_with_timeout(path, STAT_READ_LIMIT, self.read_timeout)
                .await
                .ok_warn()
        else {
            return T::default();
        };

        let (stat, errors) = parse(&content);
        for err in errors {
            log::warn!(
                "malformed `{}` for container {}: {}",
                file_name,
                container_id,
                err
            );
        }
        stat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{block_on_abandoning_blocked_reads, make_fifo};

    fn write_scope(root: &Path, id: &str, files: &[(&str, &str)]) {
        let dir = root.join("system.slice").join(format!("docker-{id}.scope"));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, content) in files {
            std::fs::write(dir.join(name), content).unwrap();
        }
    }

    fn reader(root: &Path) -> StatReader {
        StatReader::new(root, "system.slice", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_read_all_files() {
        let tmp = tempfile::tempdir().unwrap();
        write_scope(
            tmp.path(),
            "abc",
            &[
                (MEMORY_CURRENT, "104857600\n"),
                (MEMORY_STAT, "anon 10\nkernel 20\nkernel_stack 5\n"),
                (CPU_STAT, "usage_usec 5000000\nnr_periods 3\n"),
                (
                    IO_STAT,
                    "8:0 rbytes=1024 wbytes=2048 rios=1 wios=2\n8:16 rbytes=1024 wbytes=0 rios=1 wios=0\n",
                ),
            ],
        );

        let id = ContainerID::new("abc").unwrap();
        let stats = reader(tmp.path()).read(&id).await;

        assert_eq!(stats.memory_usage.usage_bytes, 104_857_600);
        assert_eq!(stats.memory_stat.kernel, 20);
        assert_eq!(stats.memory_stat.kernel_stack, 5);
        assert_eq!(stats.cpu_stat.usage_usec, 5_000_000);
        assert_eq!(stats.io_stat.rbytes, 2048);
        assert_eq!(stats.io_stat.wbytes, 2048);
        assert_eq!(stats.io_stat.rios, 2);
        assert_eq!(stats.io_stat.wios, 2);
    }

    #[tokio::test]
    async fn test_missing_files_yield_zero() {
        let tmp = tempfile::tempdir().unwrap();
        write_scope(tmp.path(), "partial", &[(CPU_STAT, "usage_usec 77\n")]);

        let id = ContainerID::new("partial").unwrap();
        let stats = reader(tmp.path()).read(&id).await;

        assert_eq!(stats.cpu_stat.usage_usec, 77);
        assert_eq!(stats.memory_usage, MemoryUsage::default());
        assert_eq!(stats.memory_stat, MemoryStat::default());
        assert_eq!(stats.io_stat, IoStat::default());
    }

    #[tokio::test]
    async fn test_missing_scope_yields_all_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let id = ContainerID::new("gone").unwrap();
        let stats = reader(tmp.path()).read(&id).await;
        assert_eq!(stats, CgroupStats::default());
    }

    #[tokio::test]
    async fn test_malformed_content_yields_zero_field() {
        let tmp = tempfile::tempdir().unwrap();
        write_scope(
            tmp.path(),
            "bad",
            &[(MEMORY_CURRENT, "garbage\n"), (IO_STAT, "8:0 rbytes=12 rios=x\n")],
        );

        let id = ContainerID::new("bad").unwrap();
        let stats = reader(tmp.path()).read(&id).await;

        assert_eq!(stats.memory_usage.usage_bytes, 0);
        assert_eq!(stats.io_stat.rbytes, 12);
        assert_eq!(stats.io_stat.rios, 0);
    }

    #[test]
    fn test_slow_file_times_out_to_zero() {
        let tmp = tempfile::tempdir().unwrap();
        write_scope(
            tmp.path(),
            "slow",
            &[
                (MEMORY_STAT, "anon 10\nkernel 20\n"),
                (CPU_STAT, "usage_usec 900\n"),
                (IO_STAT, "8:0 rbytes=1 wbytes=2 rios=3 wios=4\n"),
            ],
        );
        make_fifo(
            &tmp.path()
                .join("system.slice/docker-slow.scope")
                .join(MEMORY_CURRENT),
        );
        let reader = StatReader::new(tmp.path(), "system.slice", Duration::from_millis(50));
        let id = ContainerID::new("slow").unwrap();

        let started = std::time::Instant::now();
        let stats = block_on_abandoning_blocked_reads(reader.read(&id));

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(stats.memory_usage, MemoryUsage::default());
        assert_eq!(stats.memory_stat.kernel, 20);
        assert_eq!(stats.cpu_stat.usage_usec, 900);
        assert_eq!(stats.io_stat.wios, 4);
    }
}
